//! Body replay: reproduce a request payload for every attempt.
//!
//! A strategy is run once per call, before the first attempt. It takes the
//! original body out of the request (which closes it when dropped) and returns
//! a factory that produces a fresh, independent body each time it is called.

use std::io::{self, Read};
use std::sync::Arc;

use crate::request::{Body, Request};

/// Produces a new body reading the original payload from the start.
pub type BodyFactory = Box<dyn Fn() -> Body + Send + Sync>;

/// Turns a request's one-shot body into a repeatable one.
pub trait BodyReplay: Send + Sync {
    /// Consume the request's body and return a factory for replays.
    /// An error here ends the call before any attempt is made.
    fn prepare(&self, request: &mut Request) -> io::Result<BodyFactory>;
}

/// Upper bound on the buffer reserved up front from a declared body length.
const MAX_PREALLOC: u64 = 1 << 20;

/// Read the whole body into memory once and serve copies of it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheBody;

impl BodyReplay for CacheBody {
    fn prepare(&self, request: &mut Request) -> io::Result<BodyFactory> {
        let mut original = request.take_body();
        let mut buf = Vec::with_capacity(original.len().unwrap_or(0).min(MAX_PREALLOC) as usize);
        if !original.is_empty() {
            original.read_to_end(&mut buf)?;
        }
        drop(original);

        let shared: Arc<[u8]> = Arc::from(buf);
        Ok(Box::new(move || Body::from_shared(Arc::clone(&shared))))
    }
}

/// Re-derive the body from a closure on every attempt instead of buffering
/// the original, e.g. re-serializing a value or reopening a file.
/// The original body is dropped unread.
pub struct FnBody<F> {
    make: Arc<F>,
}

/// Build a [`FnBody`] strategy from `make`.
pub fn from_fn<F>(make: F) -> FnBody<F>
where
    F: Fn() -> Body + Send + Sync + 'static,
{
    FnBody {
        make: Arc::new(make),
    }
}

impl<F> BodyReplay for FnBody<F>
where
    F: Fn() -> Body + Send + Sync + 'static,
{
    fn prepare(&self, request: &mut Request) -> io::Result<BodyFactory> {
        drop(request.take_body());
        let make = Arc::clone(&self.make);
        Ok(Box::new(move || (*make)()))
    }
}
