//! Request and response values exchanged with a [`Sender`](crate::sender::Sender).
//!
//! A `Request` owns its body as a one-shot reader. Anything that needs to send
//! the same payload more than once (the retry loop) goes through a
//! [`BodyReplay`](crate::retry::BodyReplay) strategy instead of reading the
//! body directly.

use std::fmt;
use std::io::{self, Read};
use std::mem;
use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use url::Url;

use crate::control::CancelToken;
use crate::retry::RetryOptions;

/// Readable request payload. Dropping it closes the underlying reader.
pub struct Body {
    reader: Box<dyn Read + Send>,
    len: Option<u64>,
}

impl Body {
    /// A body with no content.
    pub fn empty() -> Self {
        Self::from_shared(Arc::from(Vec::new()))
    }

    /// Body backed by an owned byte buffer.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_shared(Arc::from(bytes.into()))
    }

    /// Body backed by a shared buffer; cheap to produce repeatedly.
    pub fn from_shared(bytes: Arc<[u8]>) -> Self {
        let len = bytes.len() as u64;
        Self {
            reader: Box::new(io::Cursor::new(bytes)),
            len: Some(len),
        }
    }

    /// Body streamed from an arbitrary reader. `len` is the exact size if known.
    pub fn from_reader<R>(reader: R, len: Option<u64>) -> Self
    where
        R: Read + Send + 'static,
    {
        Self {
            reader: Box::new(reader),
            len,
        }
    }

    /// Exact length in bytes, when known up front.
    pub fn len(&self) -> Option<u64> {
        self.len
    }

    /// True only when the body is known to be empty.
    pub fn is_empty(&self) -> bool {
        self.len == Some(0)
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body").field("len", &self.len).finish_non_exhaustive()
    }
}

/// An outgoing HTTP request.
#[derive(Debug)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
    retry: Option<Arc<RetryOptions>>,
    cancel: Option<CancelToken>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Body::empty(),
            retry: None,
            cancel: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Parse `url` and build a request for it.
    pub fn parse(method: Method, url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(method, Url::parse(url)?))
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Attach retry overrides for this request only. Fields left unset fall
    /// back to the transport's options, then to the built-in defaults.
    pub fn with_retry(mut self, options: RetryOptions) -> Self {
        self.retry = Some(Arc::new(options));
        self
    }

    /// Attach a cancellation token observed between attempts.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn retry_options(&self) -> Option<&RetryOptions> {
        self.retry.as_deref()
    }

    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }

    /// Move the body out, leaving an empty one in its place.
    pub fn take_body(&mut self) -> Body {
        mem::take(&mut self.body)
    }

    /// Structural copy of this request carrying `body` instead of the original.
    pub(crate) fn replay(&self, body: Body) -> Request {
        Request {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body,
            retry: self.retry.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

/// A fully received HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
