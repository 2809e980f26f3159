//! Classifiers: decide from an attempt's outcome whether to try again.
//!
//! A classifier sees the response (if one arrived) and the error (if one
//! occurred). Either may be absent; built-in classifiers treat "neither" as
//! not retry-worthy.

use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use super::error::SendError;
use crate::request::Response;

/// Predicate over an attempt's outcome.
pub trait Classifier: Send + Sync {
    fn should_retry(&self, response: Option<&Response>, error: Option<&SendError>) -> bool;
}

/// Apply `classifier` to a sender result.
pub(crate) fn classify_outcome(
    classifier: &dyn Classifier,
    outcome: &Result<Response, SendError>,
) -> bool {
    match outcome {
        Ok(resp) => classifier.should_retry(Some(resp), None),
        Err(e) => classifier.should_retry(None, Some(e)),
    }
}

/// Retry iff an error occurred. Responses of any status are final.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyError;

impl Classifier for AnyError {
    fn should_retry(&self, _response: Option<&Response>, error: Option<&SendError>) -> bool {
        error.is_some()
    }
}

/// Retry on any error or on a 5xx (or higher) status.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerErrorOrWorse;

impl Classifier for ServerErrorOrWorse {
    fn should_retry(&self, response: Option<&Response>, error: Option<&SendError>) -> bool {
        error.is_some() || response.is_some_and(|r| r.status.as_u16() >= 500)
    }
}

/// Retry only failures that are likely to clear up by themselves: network
/// timeouts and connection failures, throttling (429) and gateway/availability
/// statuses (502, 503, 504). Other errors and statuses are final.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientFailure;

impl Classifier for TransientFailure {
    fn should_retry(&self, response: Option<&Response>, error: Option<&SendError>) -> bool {
        if let Some(e) = error {
            return e.is_transient();
        }
        response.is_some_and(|r| is_transient_status(r.status))
    }
}

/// Statuses that signal a temporary condition on the server side.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// True if any member is true. Stops at the first true; empty is false.
#[derive(Clone, Default)]
pub struct Or(Vec<Arc<dyn Classifier>>);

impl Or {
    pub fn new(classifiers: Vec<Arc<dyn Classifier>>) -> Self {
        Self(classifiers)
    }

    pub fn with(mut self, classifier: impl Classifier + 'static) -> Self {
        self.0.push(Arc::new(classifier));
        self
    }
}

impl Classifier for Or {
    fn should_retry(&self, response: Option<&Response>, error: Option<&SendError>) -> bool {
        self.0.iter().any(|c| c.should_retry(response, error))
    }
}

/// True if every member is true. Stops at the first false; empty is false.
#[derive(Clone, Default)]
pub struct And(Vec<Arc<dyn Classifier>>);

impl And {
    pub fn new(classifiers: Vec<Arc<dyn Classifier>>) -> Self {
        Self(classifiers)
    }

    pub fn with(mut self, classifier: impl Classifier + 'static) -> Self {
        self.0.push(Arc::new(classifier));
        self
    }
}

impl Classifier for And {
    fn should_retry(&self, response: Option<&Response>, error: Option<&SendError>) -> bool {
        // An empty conjunction never retries.
        !self.0.is_empty() && self.0.iter().all(|c| c.should_retry(response, error))
    }
}

impl fmt::Debug for Or {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Or({} classifiers)", self.0.len())
    }
}

impl fmt::Debug for And {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "And({} classifiers)", self.0.len())
    }
}

/// Classifier backed by a closure. Build with [`from_fn`].
#[derive(Clone)]
pub struct FnClassifier<F>(F);

/// Wrap a closure as a classifier.
pub fn from_fn<F>(f: F) -> FnClassifier<F>
where
    F: Fn(Option<&Response>, Option<&SendError>) -> bool + Send + Sync,
{
    FnClassifier(f)
}

impl<F> Classifier for FnClassifier<F>
where
    F: Fn(Option<&Response>, Option<&SendError>) -> bool + Send + Sync,
{
    fn should_retry(&self, response: Option<&Response>, error: Option<&SendError>) -> bool {
        (self.0)(response, error)
    }
}

/// Any error or any 5xx status.
pub fn error_or_5xx() -> Or {
    Or::default().with(AnyError).with(ServerErrorOrWorse)
}
