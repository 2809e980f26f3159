//! Error returned by a single send attempt.

use std::fmt;
use std::io;

/// Error from one exchange with a sender, or from preparing to send.
///
/// The retry loop never wraps or translates sender errors: whatever the last
/// attempt produced is what the caller sees.
#[derive(Debug)]
pub enum SendError {
    /// Curl reported an error (timeout, connection, TLS, etc.).
    Curl(curl::Error),
    /// Reading the request body while uploading failed.
    Body(io::Error),
    /// The original body could not be captured for replay. No attempt was made.
    BodyReplay(io::Error),
    /// The server's reply could not be turned into a response.
    InvalidResponse(String),
    /// The call was cancelled through its [`CancelToken`](crate::control::CancelToken).
    Aborted,
    /// Any other sender-specific failure.
    Other(String),
}

impl SendError {
    pub fn other(msg: impl Into<String>) -> Self {
        SendError::Other(msg.into())
    }

    /// Network-level failures that are usually worth another attempt:
    /// timeouts, refused or reset connections, DNS failures, empty replies
    /// and bodies cut off mid-transfer.
    pub fn is_transient(&self) -> bool {
        match self {
            SendError::Curl(e) => {
                e.is_operation_timedout()
                    || e.is_couldnt_connect()
                    || e.is_couldnt_resolve_host()
                    || e.is_couldnt_resolve_proxy()
                    || e.is_recv_error()
                    || e.is_send_error()
                    || e.is_got_nothing()
                    || e.is_partial_file()
            }
            _ => false,
        }
    }
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Curl(e) => write!(f, "{}", e),
            SendError::Body(e) => write!(f, "request body: {}", e),
            // Shown exactly as the replay strategy reported it.
            SendError::BodyReplay(e) => write!(f, "{}", e),
            SendError::InvalidResponse(msg) => write!(f, "invalid response: {}", msg),
            SendError::Aborted => write!(f, "request aborted"),
            SendError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SendError::Curl(e) => Some(e),
            SendError::Body(e) => Some(e),
            SendError::BodyReplay(e) => e.source(),
            SendError::InvalidResponse(_) | SendError::Aborted | SendError::Other(_) => None,
        }
    }
}

impl From<curl::Error> for SendError {
    fn from(e: curl::Error) -> Self {
        SendError::Curl(e)
    }
}
