//! `hrt send` – send one request through the retry transport.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use hrt_core::config::HrtConfig;
use hrt_core::request::{Body, Request};
use hrt_core::retry::{RetryOptions, RetryTransport};
use hrt_core::sender::CurlSender;
use hrt_core::Client;
use http::header::{HeaderName, HeaderValue};
use http::Method;

use crate::cli::SendArgs;

pub fn run_send(cfg: &HrtConfig, args: &SendArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method {:?}", args.method))?;
    let mut request = Request::parse(method, &args.url)
        .with_context(|| format!("invalid URL {:?}", args.url))?;
    match request.url.scheme() {
        "http" | "https" => {}
        other => bail!("unsupported URL scheme {:?}", other),
    }
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value);
    }
    if let Some(data) = &args.data {
        request = request.with_body(Body::from_bytes(data.as_bytes()));
    }

    let sender = Arc::new(CurlSender::new(cfg.curl_options()));
    let client = if args.no_retry {
        Client::new(sender)
    } else {
        let transport = RetryTransport::new(sender).with_options(cfg.retry_options()?);
        request = request.with_retry(overrides(args));
        Client::new(Arc::new(transport))
    };

    let resp = client.send(request)?;
    eprintln!("{}", resp.status);
    for (name, value) in resp.headers.iter() {
        eprintln!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()));
    }
    let mut out = std::io::stdout().lock();
    out.write_all(&resp.body)?;
    out.flush()?;
    Ok(())
}

/// Per-request options from command-line flags.
fn overrides(args: &SendArgs) -> RetryOptions {
    let mut opts = RetryOptions::new();
    if let Some(n) = args.retries {
        opts = opts.times(n);
    }
    if let Some(secs) = args.max_duration {
        opts = opts.max_duration(Duration::from_secs(secs));
    }
    opts
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("header {:?} is not in 'Name: value' form", raw);
    };
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .with_context(|| format!("invalid header name in {:?}", raw))?;
    let value = HeaderValue::from_str(value.trim())
        .with_context(|| format!("invalid header value in {:?}", raw))?;
    Ok((name, value))
}
