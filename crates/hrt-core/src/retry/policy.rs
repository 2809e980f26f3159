use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::Method;

use super::backoff::{BackoffStrategy, ExponentialJitter};
use super::body::{BodyReplay, CacheBody};
use super::classify::{classify_outcome, AnyError, Classifier};
use super::error::SendError;
use crate::request::Response;

/// Retries allowed after the first attempt when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Total time budget for one call when none is configured.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(3 * 60);

/// Default backoff: exponential from 100ms to 30s, doubling, with jitter.
pub fn default_backoff() -> ExponentialJitter {
    ExponentialJitter::new(Duration::from_millis(100), Duration::from_secs(30), 2.0)
}

/// Default classifier: retry transport errors only.
pub fn default_classifier() -> AnyError {
    AnyError
}

/// Methods retried when none are configured.
pub fn default_methods() -> Vec<Method> {
    vec![Method::GET]
}

/// Retry overrides. Every field is optional; unset fields resolve to the
/// defaults above. Values are immutable once attached to a transport or
/// request.
#[derive(Clone, Default)]
pub struct RetryOptions {
    /// Retries after the first attempt. `Some(0)` disables retrying.
    pub max_attempts: Option<u32>,
    /// Total time budget measured from the first attempt. Zero means unset.
    pub max_duration: Option<Duration>,
    pub backoff: Option<Arc<dyn BackoffStrategy>>,
    pub classifier: Option<Arc<dyn Classifier>>,
    pub body_replay: Option<Arc<dyn BodyReplay>>,
    /// Methods that may be retried. Others are sent exactly once.
    pub methods: Option<Vec<Method>>,
}

impl RetryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn times(mut self, retries: u32) -> Self {
        self.max_attempts = Some(retries);
        self
    }

    pub fn max_duration(mut self, budget: Duration) -> Self {
        self.max_duration = Some(budget);
        self
    }

    pub fn backoff(mut self, backoff: impl BackoffStrategy + 'static) -> Self {
        self.backoff = Some(Arc::new(backoff));
        self
    }

    pub fn classifier(mut self, classifier: impl Classifier + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    pub fn body_replay(mut self, strategy: impl BodyReplay + 'static) -> Self {
        self.body_replay = Some(Arc::new(strategy));
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Layer `top` over `self`: fields set in `top` win.
    pub fn overlay(&self, top: &RetryOptions) -> RetryOptions {
        RetryOptions {
            max_attempts: top.max_attempts.or(self.max_attempts),
            // A zero budget counts as unset.
            max_duration: top.max_duration.filter(|d| !d.is_zero()).or(self.max_duration),
            backoff: top.backoff.clone().or_else(|| self.backoff.clone()),
            classifier: top.classifier.clone().or_else(|| self.classifier.clone()),
            body_replay: top.body_replay.clone().or_else(|| self.body_replay.clone()),
            methods: top.methods.clone().or_else(|| self.methods.clone()),
        }
    }

    /// Fill every unset field with its default.
    pub fn resolve(&self) -> RetryPolicy {
        RetryPolicy {
            classifier: self
                .classifier
                .clone()
                .unwrap_or_else(|| Arc::new(default_classifier())),
            backoff: self
                .backoff
                .clone()
                .unwrap_or_else(|| Arc::new(default_backoff())),
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            max_duration: self
                .max_duration
                .filter(|d| !d.is_zero())
                .unwrap_or(DEFAULT_MAX_DURATION),
            body_replay: self
                .body_replay
                .clone()
                .unwrap_or_else(|| Arc::new(CacheBody)),
            allowed_methods: self.methods.clone().unwrap_or_else(default_methods),
        }
    }
}

impl fmt::Debug for RetryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("max_duration", &self.max_duration)
            .field("backoff", &self.backoff.as_ref().map(|_| "custom"))
            .field("classifier", &self.classifier.as_ref().map(|_| "custom"))
            .field("body_replay", &self.body_replay.as_ref().map(|_| "custom"))
            .field("methods", &self.methods)
            .finish()
    }
}

/// Why the loop stopped retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The classifier did not consider the outcome retry-worthy.
    Final,
    /// The retry budget (`max_attempts`) is used up.
    Exhausted,
    /// The request method is not in the allowed set.
    MethodNotAllowed,
    /// Elapsed time exceeds `max_duration`.
    DeadlineExceeded,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Final => write!(f, "outcome is final"),
            StopReason::Exhausted => write!(f, "retries exhausted"),
            StopReason::MethodNotAllowed => write!(f, "method not retryable"),
            StopReason::DeadlineExceeded => write!(f, "max duration exceeded"),
        }
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Return the last outcome to the caller.
    Stop(StopReason),
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Fully resolved retry parameters for one call.
#[derive(Clone)]
pub struct RetryPolicy {
    pub classifier: Arc<dyn Classifier>,
    pub backoff: Arc<dyn BackoffStrategy>,
    pub max_attempts: u32,
    pub max_duration: Duration,
    pub body_replay: Arc<dyn BodyReplay>,
    pub allowed_methods: Vec<Method>,
}

impl RetryPolicy {
    pub fn allows(&self, method: &Method) -> bool {
        self.allowed_methods.iter().any(|m| m == method)
    }

    /// Evaluate an attempt's outcome.
    ///
    /// `retries` is how many retries have already been made (0 after the first
    /// attempt). All four stop conditions are evaluated; when several hold,
    /// the first in the order method, classifier, attempts, deadline is
    /// reported. Otherwise the delay for retry number `retries + 1` is returned.
    pub fn decide(
        &self,
        retries: u32,
        method: &Method,
        elapsed: Duration,
        outcome: &Result<Response, SendError>,
    ) -> RetryDecision {
        let retry_worthy = classify_outcome(self.classifier.as_ref(), outcome);
        let exhausted = retries >= self.max_attempts;
        let method_allowed = self.allows(method);
        let past_deadline = self.past_deadline(elapsed);

        if !method_allowed {
            return RetryDecision::Stop(StopReason::MethodNotAllowed);
        }
        if !retry_worthy {
            return RetryDecision::Stop(StopReason::Final);
        }
        if exhausted {
            return RetryDecision::Stop(StopReason::Exhausted);
        }
        if past_deadline {
            return RetryDecision::Stop(StopReason::DeadlineExceeded);
        }
        RetryDecision::RetryAfter(self.backoff.delay(retries + 1))
    }

    pub fn past_deadline(&self, elapsed: Duration) -> bool {
        elapsed > self.max_duration
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("max_duration", &self.max_duration)
            .field("allowed_methods", &self.allowed_methods)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::backoff::Constant;
    use crate::retry::classify::{self, ServerErrorOrWorse};
    use http::StatusCode;

    fn ok(code: u16) -> Result<Response, SendError> {
        Ok(Response::new(StatusCode::from_u16(code).unwrap()))
    }

    fn always_retry() -> RetryPolicy {
        RetryOptions::new()
            .classifier(classify::from_fn(|_, _| true))
            .backoff(Constant(Duration::from_secs(1)))
            .times(3)
            .resolve()
    }

    #[test]
    fn defaults_fill_unset_fields() {
        let p = RetryOptions::new().resolve();
        assert_eq!(p.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(p.max_attempts, 10);
        assert_eq!(p.max_duration, Duration::from_secs(180));
        assert_eq!(p.allowed_methods, vec![Method::GET]);
        // default classifier retries errors, not statuses
        assert!(classify_outcome(p.classifier.as_ref(), &Err(SendError::other("x"))));
        assert!(!classify_outcome(p.classifier.as_ref(), &ok(503)));
        // default backoff: 100ms * 2^n within +-100ms, capped at 30s
        let d1 = p.backoff.delay(1);
        assert!(d1 >= Duration::from_millis(100) && d1 <= Duration::from_millis(300));
        assert!(p.backoff.delay(30) <= Duration::from_secs(30));
    }

    #[test]
    fn zero_duration_means_default_but_zero_attempts_is_kept() {
        let p = RetryOptions::new()
            .max_duration(Duration::ZERO)
            .times(0)
            .resolve();
        assert_eq!(p.max_duration, DEFAULT_MAX_DURATION);
        assert_eq!(p.max_attempts, 0);
    }

    #[test]
    fn resolve_does_not_mutate_source() {
        let opts = RetryOptions::new().times(2);
        let _ = opts.resolve();
        assert_eq!(opts.max_attempts, Some(2));
        assert!(opts.backoff.is_none());
        assert!(opts.methods.is_none());
    }

    #[test]
    fn overlay_prefers_top_fields() {
        let base = RetryOptions::new()
            .times(5)
            .max_duration(Duration::from_secs(10))
            .methods([Method::GET, Method::PUT]);
        let top = RetryOptions::new().times(1);
        let merged = base.overlay(&top);
        assert_eq!(merged.max_attempts, Some(1));
        assert_eq!(merged.max_duration, Some(Duration::from_secs(10)));
        assert_eq!(merged.methods, Some(vec![Method::GET, Method::PUT]));
    }

    #[test]
    fn overlay_zero_duration_keeps_base_budget() {
        let base = RetryOptions::new().max_duration(Duration::from_secs(30));
        let top = RetryOptions::new().max_duration(Duration::ZERO);
        let policy = base.overlay(&top).resolve();
        assert_eq!(policy.max_duration, Duration::from_secs(30));

        let unset = RetryOptions::new().overlay(&top).resolve();
        assert_eq!(unset.max_duration, DEFAULT_MAX_DURATION);
    }

    #[test]
    fn decide_retries_with_backoff_of_next_attempt() {
        let p = RetryOptions::new()
            .classifier(ServerErrorOrWorse)
            .backoff(|n: u32| Duration::from_secs(u64::from(n)))
            .resolve();
        assert_eq!(
            p.decide(0, &Method::GET, Duration::ZERO, &ok(503)),
            RetryDecision::RetryAfter(Duration::from_secs(1))
        );
        assert_eq!(
            p.decide(4, &Method::GET, Duration::ZERO, &ok(503)),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
    }

    #[test]
    fn decide_stop_conditions() {
        let p = always_retry();
        assert_eq!(
            p.decide(0, &Method::POST, Duration::ZERO, &ok(500)),
            RetryDecision::Stop(StopReason::MethodNotAllowed)
        );
        assert_eq!(
            p.decide(3, &Method::GET, Duration::ZERO, &ok(500)),
            RetryDecision::Stop(StopReason::Exhausted)
        );
        assert_eq!(
            p.decide(0, &Method::GET, Duration::from_secs(181), &ok(500)),
            RetryDecision::Stop(StopReason::DeadlineExceeded)
        );
        // exactly at the budget is still inside it
        assert!(matches!(
            p.decide(0, &Method::GET, Duration::from_secs(180), &ok(500)),
            RetryDecision::RetryAfter(_)
        ));

        let never = RetryOptions::new().classifier(classify::Or::default()).resolve();
        assert_eq!(
            never.decide(0, &Method::GET, Duration::ZERO, &Err(SendError::other("x"))),
            RetryDecision::Stop(StopReason::Final)
        );
    }
}
