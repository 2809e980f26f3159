//! Senders perform one HTTP exchange per call.
//!
//! [`Sender`] is the seam the retry loop wraps. [`CurlSender`] is the
//! production implementation over libcurl; tests and embedders can plug in
//! their own.

mod libcurl;
mod parse;

use crate::request::{Request, Response};
use crate::retry::SendError;

pub use self::libcurl::{CurlOptions, CurlSender};
pub use self::parse::parse_header_lines;

/// Performs a single request/response exchange.
///
/// Implementations must be `Send + Sync`: one sender is shared by every call
/// going through a client, possibly from several threads at once, and may be
/// called repeatedly with structurally identical requests.
pub trait Sender: Send + Sync {
    fn send(&self, request: Request) -> Result<Response, SendError>;

    /// True for senders that already run the retry loop.
    /// Used to keep [`enable`](crate::retry::enable) idempotent.
    fn is_retry_transport(&self) -> bool {
        false
    }
}

/// Sender backed by a closure. Build with [`from_fn`].
pub struct FnSender<F>(F);

pub fn from_fn<F>(f: F) -> FnSender<F>
where
    F: Fn(Request) -> Result<Response, SendError> + Send + Sync,
{
    FnSender(f)
}

impl<F> Sender for FnSender<F>
where
    F: Fn(Request) -> Result<Response, SendError> + Send + Sync,
{
    fn send(&self, request: Request) -> Result<Response, SendError> {
        (self.0)(request)
    }
}
