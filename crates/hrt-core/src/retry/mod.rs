//! Retry policy and the retrying transport.
//!
//! This module encapsulates the decision of whether an outbound request gets
//! another attempt (classification), how long to wait first (backoff), how the
//! payload is reproduced (body replay) and the attempt loop that ties them
//! together, so that callers share one consistent policy.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use hrt_core::request::Request;
//! use hrt_core::retry::{backoff, classify, RetryOptions, RetryTransport};
//! use hrt_core::sender::{CurlSender, Sender};
//!
//! let transport = RetryTransport::new(Arc::new(CurlSender::default())).with_options(
//!     RetryOptions::new()
//!         .times(3)
//!         .classifier(classify::ServerErrorOrWorse)
//!         .backoff(backoff::Linear::new(Duration::from_millis(200), Duration::from_secs(2))),
//! );
//! let url = url::Url::parse("https://example.com/").unwrap();
//! let resp = transport.send(Request::get(url));
//! ```

pub mod backoff;
pub mod body;
pub mod classify;
mod error;
mod policy;
mod run;

pub use backoff::BackoffStrategy;
pub use body::{BodyFactory, BodyReplay, CacheBody};
pub use classify::Classifier;
pub use error::SendError;
pub use policy::{
    default_backoff, default_classifier, default_methods, RetryDecision, RetryOptions,
    RetryPolicy, StopReason, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DURATION,
};
pub use run::{enable, RetryTransport};
