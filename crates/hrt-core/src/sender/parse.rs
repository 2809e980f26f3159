//! Parse raw HTTP response header lines into a `HeaderMap`.

use http::header::{HeaderMap, HeaderName, HeaderValue};

/// Parse collected header lines into a map.
///
/// libcurl reports the headers of every response it saw, including
/// intermediate ones (redirects, `100 Continue`). A status line resets the
/// map so only the final response's headers remain. Lines that are not valid
/// `name: value` pairs are skipped.
pub fn parse_header_lines(lines: &[String]) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = match HeaderName::from_bytes(name.trim().as_bytes()) {
                Ok(n) => n,
                Err(_) => continue,
            };
            let value = match HeaderValue::from_str(value.trim()) {
                Ok(v) => v,
                Err(_) => continue,
            };
            headers.append(name, value);
        }
    }

    headers
}
