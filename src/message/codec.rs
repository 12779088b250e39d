//! Wire format encode/decode.
//!
//! # Responsibilities
//! - Read a request head (request line + headers) up to the blank line
//! - Read exactly `Content-Length` body bytes
//! - Render a response as status line, headers, blank line, body
//!
//! # Design Decisions
//! - Header section size is bounded while reading, before it is buffered
//! - Declared body size is checked before any body byte is read
//! - `\r\n` and bare `\n` line endings are both accepted

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::config::ListenerConfig;
use crate::message::{Request, Response};

/// Why a request could not be read.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("connection closed before a request was received")]
    ConnectionClosed,

    #[error("connection closed in the middle of the request head")]
    IncompleteHead,

    #[error("malformed request line {0:?}")]
    RequestLine(String),

    #[error("invalid method {0:?}")]
    Method(String),

    #[error("path must start with '/', got {0:?}")]
    Path(String),

    #[error("unsupported protocol version {0:?}")]
    Version(String),

    #[error("malformed header line {0:?}")]
    Header(String),

    #[error("invalid Content-Length {0:?}")]
    ContentLength(String),

    #[error("request head exceeds {0} bytes")]
    HeadersTooLarge(usize),

    #[error("declared body of {declared} bytes exceeds the {limit} byte limit")]
    BodyTooLarge { declared: usize, limit: usize },

    #[error("body truncated: expected {expected} bytes, received {received}")]
    IncompleteBody { expected: usize, received: usize },

    #[error("request head is not valid UTF-8")]
    Encoding,

    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// True when the client sent something that deserves a 400.
    ///
    /// A clean close or a transport failure leaves nobody to answer.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, ParseError::ConnectionClosed | ParseError::Io(_))
    }
}

/// Size bounds applied while reading a request.
#[derive(Debug, Clone, Copy)]
pub struct ParseLimits {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self::from(&ListenerConfig::default())
    }
}

impl From<&ListenerConfig> for ParseLimits {
    fn from(config: &ListenerConfig) -> Self {
        Self {
            max_header_bytes: config.max_header_bytes,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// Parse a complete request from a byte buffer.
pub fn parse_request(raw: &[u8], limits: &ParseLimits) -> Result<Request, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::ConnectionClosed);
    }

    let (head_end, body_start) = match find_head_end(raw) {
        Some(bounds) => bounds,
        None if raw.len() > limits.max_header_bytes => {
            return Err(ParseError::HeadersTooLarge(limits.max_header_bytes))
        }
        None => return Err(ParseError::IncompleteHead),
    };
    if body_start > limits.max_header_bytes {
        return Err(ParseError::HeadersTooLarge(limits.max_header_bytes));
    }

    let head = std::str::from_utf8(&raw[..head_end]).map_err(|_| ParseError::Encoding)?;
    let (method, path, headers) = parse_head(head)?;

    let expected = content_length(&headers, limits)?;
    let available = &raw[body_start..];
    if available.len() < expected {
        return Err(ParseError::IncompleteBody {
            expected,
            received: available.len(),
        });
    }

    Ok(Request::from_parts(
        method,
        path,
        headers,
        available[..expected].to_vec(),
    ))
}

/// Read one request from a buffered stream.
pub async fn read_request<R>(reader: &mut R, limits: &ParseLimits) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = Vec::new();
    let mut line = Vec::new();
    let mut consumed = 0usize;

    loop {
        let remaining = limits.max_header_bytes.saturating_sub(consumed);
        if remaining == 0 {
            return Err(ParseError::HeadersTooLarge(limits.max_header_bytes));
        }

        line.clear();
        let read = (&mut *reader)
            .take(remaining as u64)
            .read_until(b'\n', &mut line)
            .await?;
        consumed += read;

        if read == 0 {
            return Err(if head.is_empty() {
                ParseError::ConnectionClosed
            } else {
                ParseError::IncompleteHead
            });
        }
        if line.last() != Some(&b'\n') {
            return Err(if read == remaining {
                ParseError::HeadersTooLarge(limits.max_header_bytes)
            } else {
                ParseError::IncompleteHead
            });
        }

        let blank = line == b"\r\n" || line == b"\n";
        if blank && head.is_empty() {
            // Stray CRLF before the request line.
            continue;
        }
        if blank {
            break;
        }
        head.extend_from_slice(&line);
    }

    let head = std::str::from_utf8(&head).map_err(|_| ParseError::Encoding)?;
    let (method, path, headers) = parse_head(head)?;

    let expected = content_length(&headers, limits)?;
    let mut body = Vec::with_capacity(expected);
    if expected > 0 {
        (&mut *reader)
            .take(expected as u64)
            .read_to_end(&mut body)
            .await?;
        if body.len() < expected {
            return Err(ParseError::IncompleteBody {
                expected,
                received: body.len(),
            });
        }
    }

    Ok(Request::from_parts(method, path, headers, body))
}

/// Render a response for the wire.
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut out = Vec::with_capacity(128 + response.body().len());
    out.extend_from_slice(
        format!(
            "HTTP/1.1 {} {}\r\n",
            response.status().as_u16(),
            response.reason()
        )
        .as_bytes(),
    );

    for (name, value) in response.headers() {
        if *name == CONTENT_LENGTH {
            continue;
        }
        out.extend_from_slice(name.as_str().as_bytes());
        out.extend_from_slice(b": ");
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    if response.allows_body() {
        out.extend_from_slice(format!("content-length: {}\r\n", response.body().len()).as_bytes());
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(response.body());
    } else {
        out.extend_from_slice(b"\r\n");
    }
    out
}

/// Returns (end of head, start of body) for the first blank line.
fn find_head_end(raw: &[u8]) -> Option<(usize, usize)> {
    let mut start = 0;
    while let Some(offset) = raw[start..].iter().position(|&b| b == b'\n') {
        let newline = start + offset;
        let rest = &raw[newline + 1..];
        if rest.starts_with(b"\r\n") {
            return Some((newline + 1, newline + 3));
        }
        if rest.starts_with(b"\n") {
            return Some((newline + 1, newline + 2));
        }
        start = newline + 1;
    }
    None
}

fn parse_head(head: &str) -> Result<(Method, String, HeaderMap), ParseError> {
    let mut lines = head.lines();
    let request_line = lines
        .next()
        .ok_or_else(|| ParseError::RequestLine(String::new()))?;

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let [method, path, version] = parts.as_slice() else {
        return Err(ParseError::RequestLine(request_line.to_string()));
    };

    let method =
        Method::from_bytes(method.as_bytes()).map_err(|_| ParseError::Method(method.to_string()))?;
    if !path.starts_with('/') {
        return Err(ParseError::Path(path.to_string()));
    }
    if !version.starts_with("HTTP/1.") {
        return Err(ParseError::Version(version.to_string()));
    }

    let mut headers = HeaderMap::new();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::Header(line.to_string()))?;
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| ParseError::Header(line.to_string()))?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|_| ParseError::Header(line.to_string()))?;
        headers.append(name, value);
    }

    Ok((method, path.to_string(), headers))
}

fn content_length(headers: &HeaderMap, limits: &ParseLimits) -> Result<usize, ParseError> {
    let Some(value) = headers.get(CONTENT_LENGTH) else {
        return Ok(0);
    };
    let text = value
        .to_str()
        .map_err(|_| ParseError::ContentLength(String::from_utf8_lossy(value.as_bytes()).into()))?;
    let declared: usize = text
        .trim()
        .parse()
        .map_err(|_| ParseError::ContentLength(text.to_string()))?;
    if declared > limits.max_body_bytes {
        return Err(ParseError::BodyTooLarge {
            declared,
            limit: limits.max_body_bytes,
        });
    }
    Ok(declared)
}

/// True when the request says its body is JSON, or says nothing at all.
pub fn is_json(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use tokio::io::BufReader;

    fn limits() -> ParseLimits {
        ParseLimits {
            max_header_bytes: 256,
            max_body_bytes: 64,
        }
    }

    #[test]
    fn parses_request_with_body() {
        let raw = b"POST /developers HTTP/1.1\r\nHost: x\r\nContent-Length: 13\r\n\r\n{\"name\":\"a\"}!extra";
        let request = parse_request(raw, &limits()).unwrap();
        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.path(), "/developers");
        assert_eq!(request.headers()["host"], "x");
        assert_eq!(request.body(), b"{\"name\":\"a\"}!");
    }

    #[test]
    fn accepts_bare_newlines() {
        let raw = b"GET /developers/1 HTTP/1.0\nAccept: */*\n\n";
        let request = parse_request(raw, &limits()).unwrap();
        assert_eq!(request.path(), "/developers/1");
        assert!(!request.has_body());
    }

    #[test]
    fn rejects_bad_request_lines() {
        let cases: &[&[u8]] = &[
            b"GET /developers\r\n\r\n",
            b"GET developers HTTP/1.1\r\n\r\n",
            b"GET /developers HTTP/2\r\n\r\n",
            b"G(T /developers HTTP/1.1\r\n\r\n",
        ];
        for raw in cases {
            let err = parse_request(raw, &limits()).unwrap_err();
            assert!(err.is_malformed(), "{err:?}");
        }
    }

    #[test]
    fn rejects_header_without_colon() {
        let raw = b"GET / HTTP/1.1\r\nbroken header\r\n\r\n";
        assert!(matches!(
            parse_request(raw, &limits()),
            Err(ParseError::Header(_))
        ));
    }

    #[test]
    fn short_body_is_malformed() {
        let raw = b"POST /developers HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc";
        assert!(matches!(
            parse_request(raw, &limits()),
            Err(ParseError::IncompleteBody { expected: 10, received: 3 })
        ));
    }

    #[test]
    fn oversized_body_is_rejected_before_reading() {
        let raw = b"POST /developers HTTP/1.1\r\nContent-Length: 65\r\n\r\n";
        assert!(matches!(
            parse_request(raw, &limits()),
            Err(ParseError::BodyTooLarge { declared: 65, limit: 64 })
        ));
    }

    #[test]
    fn non_numeric_content_length_is_malformed() {
        let raw = b"POST /developers HTTP/1.1\r\nContent-Length: ten\r\n\r\n";
        assert!(matches!(
            parse_request(raw, &limits()),
            Err(ParseError::ContentLength(_))
        ));
    }

    #[tokio::test]
    async fn reads_request_from_stream() {
        let raw: &[u8] = b"\r\nPUT /developers/3 HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}";
        let mut reader = BufReader::new(raw);
        let request = read_request(&mut reader, &limits()).await.unwrap();
        assert_eq!(*request.method(), Method::PUT);
        assert_eq!(request.body(), b"{}");
    }

    #[tokio::test]
    async fn stream_closed_early() {
        let mut empty = BufReader::new(&b""[..]);
        assert!(matches!(
            read_request(&mut empty, &limits()).await,
            Err(ParseError::ConnectionClosed)
        ));

        let mut partial = BufReader::new(&b"GET / HTTP/1.1\r\nHost"[..]);
        assert!(matches!(
            read_request(&mut partial, &limits()).await,
            Err(ParseError::IncompleteHead)
        ));

        let mut truncated =
            BufReader::new(&b"POST /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nab"[..]);
        assert!(matches!(
            read_request(&mut truncated, &limits()).await,
            Err(ParseError::IncompleteBody { expected: 5, received: 2 })
        ));
    }

    #[tokio::test]
    async fn stream_head_limit_enforced() {
        let long = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(300));
        let mut reader = BufReader::new(long.as_bytes());
        assert!(matches!(
            read_request(&mut reader, &limits()).await,
            Err(ParseError::HeadersTooLarge(256))
        ));
    }

    #[test]
    fn encodes_status_headers_and_body() {
        let response = Response::text(StatusCode::OK, "ACK");
        let wire = String::from_utf8(encode_response(&response)).unwrap();
        assert!(wire.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(wire.contains("content-type: text/plain; charset=utf-8\r\n"));
        assert!(wire.contains("content-length: 3\r\n"));
        assert!(wire.ends_with("\r\n\r\nACK"));
    }

    #[test]
    fn encodes_no_content_without_length() {
        let wire = encode_response(&Response::empty(StatusCode::NO_CONTENT));
        assert_eq!(wire, b"HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[test]
    fn json_content_type_detection() {
        let plain = Request::new(Method::POST, "/developers");
        assert!(is_json(&plain));

        let xml = plain
            .clone()
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/xml"));
        assert!(!is_json(&xml));
    }
}
