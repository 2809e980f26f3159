//! Retry loop: resend a request until the policy says stop.

use std::sync::Arc;

use super::error::SendError;
use super::policy::{RetryDecision, RetryOptions, RetryPolicy};
use crate::clock::{Clock, SystemClock};
use crate::request::{Request, Response};
use crate::sender::Sender;

/// Sender decorator that retries failed or unsatisfactory attempts.
///
/// Options given here apply to every request; options attached to a request
/// with [`Request::with_retry`] override them field by field.
pub struct RetryTransport {
    next: Arc<dyn Sender>,
    options: RetryOptions,
    clock: Arc<dyn Clock>,
}

impl RetryTransport {
    pub fn new(next: Arc<dyn Sender>) -> Self {
        Self {
            next,
            options: RetryOptions::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_options(mut self, options: RetryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Policy that would govern `request`.
    pub fn policy_for(&self, request: &Request) -> RetryPolicy {
        match request.retry_options() {
            Some(overrides) => self.options.overlay(overrides).resolve(),
            None => self.options.resolve(),
        }
    }

    fn run(&self, mut request: Request) -> Result<Response, SendError> {
        let policy = self.policy_for(&request);
        let cancel = request.cancel_token().cloned();
        let is_cancelled = || cancel.as_ref().is_some_and(|t| t.is_cancelled());

        let replay = match policy.body_replay.prepare(&mut request) {
            Ok(factory) => factory,
            Err(e) => {
                tracing::warn!(url = %request.url, "cannot prepare request body for replay: {}", e);
                return Err(SendError::BodyReplay(e));
            }
        };

        let start = self.clock.now();
        let mut retries = 0u32;
        loop {
            if is_cancelled() {
                return Err(SendError::Aborted);
            }

            let outcome = self.next.send(request.replay(replay()));
            let elapsed = self.clock.now().saturating_duration_since(start);
            tracing::debug!(
                method = %request.method,
                url = %request.url,
                attempt = retries + 1,
                elapsed_ms = elapsed.as_millis() as u64,
                status = outcome.as_ref().ok().map(|r| r.status.as_u16()),
                "attempt finished"
            );

            let delay = match policy.decide(retries, &request.method, elapsed, &outcome) {
                RetryDecision::Stop(reason) => {
                    if retries > 0 {
                        tracing::info!(url = %request.url, retries, "giving up: {}", reason);
                    }
                    return outcome;
                }
                RetryDecision::RetryAfter(delay) => delay,
            };

            retries += 1;
            match &outcome {
                Ok(resp) => tracing::warn!(
                    url = %request.url,
                    retry = retries,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after HTTP {}",
                    resp.status.as_u16()
                ),
                Err(e) => tracing::warn!(
                    url = %request.url,
                    retry = retries,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after error: {}",
                    e
                ),
            }

            if is_cancelled() {
                return Err(SendError::Aborted);
            }
            self.clock.sleep(delay);

            // Deadline is checked before the next attempt begins, not mid-sleep.
            let elapsed = self.clock.now().saturating_duration_since(start);
            if policy.past_deadline(elapsed) {
                tracing::info!(url = %request.url, retries, "giving up: max duration exceeded");
                return outcome;
            }
        }
    }
}

impl Sender for RetryTransport {
    fn send(&self, request: Request) -> Result<Response, SendError> {
        self.run(request)
    }

    fn is_retry_transport(&self) -> bool {
        true
    }
}

/// Put a [`RetryTransport`] with default options in front of `sender`.
/// A sender that already retries is returned unchanged.
pub fn enable(sender: Arc<dyn Sender>) -> Arc<dyn Sender> {
    if sender.is_retry_transport() {
        return sender;
    }
    Arc::new(RetryTransport::new(sender))
}
