//! Blocking sender over libcurl's easy interface.

use std::io::{self, Read};
use std::str;
use std::time::Duration;

use curl::easy::{Easy, List, ReadError};
use http::{Method, StatusCode};

use super::parse::parse_header_lines;
use super::Sender;
use crate::request::{Request, Response};
use crate::retry::SendError;

/// Transfer settings applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Hard limit for a whole exchange.
    pub timeout: Duration,
    pub follow_redirects: bool,
    pub max_redirections: u32,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(60),
            follow_redirects: true,
            max_redirections: 10,
        }
    }
}

/// Sends each request on a fresh curl easy handle.
/// Runs in the current thread; call from `spawn_blocking` if used from async code.
#[derive(Debug, Clone, Default)]
pub struct CurlSender {
    opts: CurlOptions,
}

impl CurlSender {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }
}

impl Sender for CurlSender {
    fn send(&self, request: Request) -> Result<Response, SendError> {
        let Request {
            method,
            url,
            headers,
            mut body,
            ..
        } = request;

        let mut easy = Easy::new();
        easy.url(url.as_str())?;
        easy.follow_location(self.opts.follow_redirects)?;
        easy.max_redirections(self.opts.max_redirections)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        easy.timeout(self.opts.timeout)?;

        let upload = !body.is_empty();
        match method {
            Method::GET if !upload => easy.get(true)?,
            Method::HEAD => easy.nobody(true)?,
            Method::POST => {
                easy.post(true)?;
                if let Some(n) = body.len() {
                    easy.post_field_size(n)?;
                }
            }
            Method::PUT => {
                easy.upload(true)?;
                if let Some(n) = body.len() {
                    easy.in_filesize(n)?;
                }
            }
            ref other => {
                easy.custom_request(other.as_str())?;
                if upload {
                    easy.upload(true)?;
                    if let Some(n) = body.len() {
                        easy.in_filesize(n)?;
                    }
                }
            }
        }

        let mut list = List::new();
        for (name, value) in headers.iter() {
            let value = String::from_utf8_lossy(value.as_bytes());
            list.append(&format!("{}: {}", name.as_str(), value.trim()))?;
        }
        if upload {
            // Unknown-length uploads go out chunked.
            if body.len().is_none() && !headers.contains_key(http::header::TRANSFER_ENCODING) {
                list.append("Transfer-Encoding: chunked")?;
            }
            // Send the body right away instead of waiting for 100-continue.
            list.append("Expect:")?;
        }
        if upload || !headers.is_empty() {
            easy.http_headers(list)?;
        }

        tracing::debug!(method = %method, url = %url, "sending request");

        let mut header_lines: Vec<String> = Vec::new();
        let mut data: Vec<u8> = Vec::new();
        let mut body_error: Option<io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer.read_function(|buf| match body.read(buf) {
                Ok(n) => Ok(n),
                Err(e) => {
                    body_error = Some(e);
                    Err(ReadError::Abort)
                }
            })?;
            transfer.header_function(|line| {
                if let Ok(s) = str::from_utf8(line) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|chunk| {
                data.extend_from_slice(chunk);
                Ok(chunk.len())
            })?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if let Some(io_err) = body_error {
                return Err(SendError::Body(io_err));
            }
            tracing::debug!(url = %url, "transfer failed: {}", e);
            return Err(SendError::Curl(e));
        }

        let code = easy.response_code()?;
        let status = u16::try_from(code)
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .ok_or_else(|| SendError::InvalidResponse(format!("status code {}", code)))?;

        Ok(Response {
            status,
            headers: parse_header_lines(&header_lines),
            body: data,
        })
    }
}
