pub mod client;
pub mod clock;
pub mod config;
pub mod control;
pub mod logging;
pub mod request;
pub mod retry;
pub mod sender;

pub use client::Client;
pub use request::{Body, Request, Response};
pub use retry::{RetryOptions, RetryPolicy, RetryTransport, SendError};
