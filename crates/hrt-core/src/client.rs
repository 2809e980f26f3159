//! Thin client that owns the sender chain.

use std::sync::Arc;

use crate::request::{Request, Response};
use crate::retry::{self, SendError};
use crate::sender::{CurlOptions, CurlSender, Sender};

/// Sends requests through a (possibly retrying) sender.
#[derive(Clone)]
pub struct Client {
    sender: Arc<dyn Sender>,
}

impl Client {
    pub fn new(sender: Arc<dyn Sender>) -> Self {
        Self { sender }
    }

    /// Client over libcurl without retries.
    pub fn curl(opts: CurlOptions) -> Self {
        Self::new(Arc::new(CurlSender::new(opts)))
    }

    /// Route requests through the retry transport. Calling it again is a no-op.
    pub fn enable_retry(&mut self) -> &mut Self {
        self.sender = retry::enable(Arc::clone(&self.sender));
        self
    }

    pub fn is_retry_enabled(&self) -> bool {
        self.sender.is_retry_transport()
    }

    pub fn sender(&self) -> &Arc<dyn Sender> {
        &self.sender
    }

    pub fn send(&self, request: Request) -> Result<Response, SendError> {
        self.sender.send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryTransport;
    use crate::sender;
    use http::{Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn enable_retry_wraps_once() {
        let mut client = Client::curl(CurlOptions::default());
        assert!(!client.is_retry_enabled());
        client.enable_retry();
        assert!(client.is_retry_enabled());
        let first = Arc::clone(client.sender());
        client.enable_retry();
        assert!(Arc::ptr_eq(&first, client.sender()));
    }

    #[test]
    fn already_wrapped_sender_is_kept() {
        let inner: Arc<dyn Sender> = Arc::new(CurlSender::default());
        let wrapped: Arc<dyn Sender> = Arc::new(RetryTransport::new(inner));
        let mut client = Client::new(Arc::clone(&wrapped));
        client.enable_retry();
        assert!(Arc::ptr_eq(&wrapped, client.sender()));
    }

    #[test]
    fn retrying_client_resends_on_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let flaky = sender::from_fn(move |_req| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SendError::other("connection reset"))
            } else {
                Ok(Response::new(StatusCode::OK))
            }
        });
        let inner: Arc<dyn Sender> = Arc::new(flaky);
        let transport = RetryTransport::new(inner).with_options(
            retry::RetryOptions::new().backoff(retry::backoff::Constant(std::time::Duration::ZERO)),
        );
        let client = Client::new(Arc::new(transport));

        let req = Request::parse(Method::GET, "http://localhost/").unwrap();
        let resp = client.send(req).unwrap();
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
