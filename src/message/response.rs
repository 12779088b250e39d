//! Response representation.
//!
//! # Design Decisions
//! - Constructors keep `Content-Length` in step with the body
//! - The codec recomputes the length on encode, so a stale header can never
//!   reach the wire
//! - Built once by a controller, router or the connection handler; never
//!   mutated after being handed to the transport

use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// An HTTP response ready to be encoded.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    /// A response with no body.
    pub fn empty(status: StatusCode) -> Self {
        let mut response = Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        };
        response.sync_content_length();
        response
    }

    /// A response carrying a JSON document.
    pub fn json(status: StatusCode, body: Vec<u8>) -> Self {
        Self::with_content(status, JSON, body)
    }

    /// A response carrying plain text.
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self::with_content(status, TEXT, body.into().into_bytes())
    }

    fn with_content(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        let mut response = Self {
            status,
            headers,
            body,
        };
        response.sync_content_length();
        response
    }

    /// Add a header. `Content-Length` is owned by the response and ignored here.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        if name != CONTENT_LENGTH {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase for the status line.
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("Unknown")
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 1xx, 204 and 304 responses never carry a body or a length.
    pub fn allows_body(&self) -> bool {
        !(self.status.is_informational()
            || self.status == StatusCode::NO_CONTENT
            || self.status == StatusCode::NOT_MODIFIED)
    }

    fn sync_content_length(&mut self) {
        if self.allows_body() {
            self.headers
                .insert(CONTENT_LENGTH, HeaderValue::from(self.body.len()));
        } else {
            self.body.clear();
            self.headers.remove(CONTENT_LENGTH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sets_type_and_length() {
        let response = Response::json(StatusCode::CREATED, br#"{"id":1}"#.to_vec());
        assert_eq!(response.headers()[CONTENT_TYPE], JSON);
        assert_eq!(response.headers()[CONTENT_LENGTH], "8");
        assert_eq!(response.reason(), "Created");
    }

    #[test]
    fn no_content_has_no_length() {
        let response = Response::empty(StatusCode::NO_CONTENT);
        assert!(response.headers().get(CONTENT_LENGTH).is_none());
        assert!(response.body().is_empty());
    }

    #[test]
    fn content_length_cannot_be_overridden() {
        let response = Response::text(StatusCode::OK, "ACK")
            .with_header(CONTENT_LENGTH, HeaderValue::from_static("99"));
        assert_eq!(response.headers()[CONTENT_LENGTH], "3");
    }
}
