//! Minimal HTTP/1.1 server that fails a fixed number of requests before succeeding.
//!
//! The first `failures` requests get `fail_status` with an empty body; every
//! later request gets 200 OK echoing the request body. Every request body is
//! recorded so tests can check what each attempt actually sent.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct FlakyServerOptions {
    /// How many requests fail before the server starts answering 200.
    pub failures: usize,
    pub fail_status: u16,
}

impl Default for FlakyServerOptions {
    fn default() -> Self {
        Self {
            failures: 0,
            fail_status: 503,
        }
    }
}

/// Handle to a running server. The server runs until the process exits.
pub struct FlakyServer {
    pub url: String,
    received: Arc<Mutex<Vec<Recorded>>>,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub body: Vec<u8>,
}

impl FlakyServer {
    pub fn hits(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn received(&self) -> Vec<Recorded> {
        self.received.lock().unwrap().clone()
    }
}

/// Starts a server that fails the first `failures` requests with 503.
pub fn start(failures: usize) -> FlakyServer {
    start_with_options(FlakyServerOptions {
        failures,
        ..FlakyServerOptions::default()
    })
}

pub fn start_with_options(opts: FlakyServerOptions) -> FlakyServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let received: Arc<Mutex<Vec<Recorded>>> = Arc::new(Mutex::new(Vec::new()));
    let shared = Arc::clone(&received);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let shared = Arc::clone(&shared);
            thread::spawn(move || handle(stream, &shared, opts));
        }
    });
    FlakyServer {
        url: format!("http://127.0.0.1:{}/", port),
        received,
    }
}

fn handle(mut stream: TcpStream, received: &Mutex<Vec<Recorded>>, opts: FlakyServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some((method, body)) = read_request(&mut stream) else {
        return;
    };

    let index = {
        let mut log = received.lock().unwrap();
        log.push(Recorded {
            method,
            body: body.clone(),
        });
        log.len()
    };

    let response = if index <= opts.failures {
        format!(
            "HTTP/1.1 {} Failing\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            opts.fail_status
        )
        .into_bytes()
    } else {
        let mut out = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(&body);
        out
    };
    let _ = stream.write_all(&response);
    let _ = stream.flush();
}

/// Reads one request. Returns (method, body) or None if the client went away.
fn read_request(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = find_header_end(&data) {
            break pos;
        }
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return None,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    };

    let head = std::str::from_utf8(&data[..header_end]).ok()?;
    let method = head.split_whitespace().next().unwrap_or("").to_string();
    let header = |wanted: &str| {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value.trim().to_string())
    };
    let chunked = header("transfer-encoding").is_some_and(|v| v.eq_ignore_ascii_case("chunked"));
    let content_length = header("content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut rest = data[header_end + 4..].to_vec();
    if chunked {
        while !rest.ends_with(b"0\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => rest.extend_from_slice(&buf[..n]),
            }
        }
        return Some((method, decode_chunked(&rest)));
    }
    while rest.len() < content_length {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => rest.extend_from_slice(&buf[..n]),
        }
    }
    rest.truncate(content_length);
    Some((method, rest))
}

fn decode_chunked(mut data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    while let Some(line_end) = data.windows(2).position(|w| w == b"\r\n") {
        let size = std::str::from_utf8(&data[..line_end])
            .ok()
            .and_then(|s| usize::from_str_radix(s.split(';').next().unwrap_or("").trim(), 16).ok())
            .unwrap_or(0);
        if size == 0 {
            break;
        }
        let start = line_end + 2;
        let end = (start + size).min(data.len());
        body.extend_from_slice(&data[start..end]);
        data = data.get(end + 2..).unwrap_or(&[]);
    }
    body
}

fn find_header_end(data: &[u8]) -> Option<usize> {
    data.windows(4).position(|w| w == b"\r\n\r\n")
}
