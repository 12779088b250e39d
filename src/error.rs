//! Request failure taxonomy.
//!
//! Controllers and the router return `HandlerError`; only the connection
//! handler turns one into a wire response, through [`HandlerError::status`]
//! and [`HandlerError::to_response`].

use http::{Method, StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::message::Response;
use crate::repository::RepositoryError;

/// Body text for every 500; the real cause stays in the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Invalid id segment, undecodable body, or unexpected path shape.
    #[error("{0}")]
    BadRequest(String),

    #[error("{resource} with id {id} not found")]
    NotFound { resource: &'static str, id: u64 },

    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed { method: Method, path: String },

    #[error("repository failure: {0}")]
    Repository(#[from] RepositoryError),

    #[error("response encoding failed: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl HandlerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotFound { .. } => StatusCode::NOT_FOUND,
            HandlerError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            HandlerError::Repository(_) | HandlerError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Wire response for this failure. Server errors never expose their cause.
    pub fn to_response(&self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error_response(status, INTERNAL_ERROR_MESSAGE)
        } else {
            error_response(status, &self.to_string())
        }
    }
}

/// JSON error document: `{"status": .., "error": .., "message": ..}`.
pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "status": status.as_u16(),
        "error": status.canonical_reason().unwrap_or("Error"),
        "message": message,
    });
    Response::json(status, body.to_string().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_fixed() {
        assert_eq!(HandlerError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            HandlerError::NotFound { resource: "developer", id: 3 }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HandlerError::MethodNotAllowed {
                method: Method::PATCH,
                path: "/developers".into()
            }
            .status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        assert_eq!(
            HandlerError::from(RepositoryError::from(io)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_detail() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let response = HandlerError::from(RepositoryError::from(io)).to_response();
        let body = String::from_utf8(response.body().to_vec()).unwrap();
        assert!(!body.contains("disk on fire"));
        assert!(body.contains(INTERNAL_ERROR_MESSAGE));
    }

    #[test]
    fn client_errors_carry_message() {
        let response = HandlerError::NotFound { resource: "developer", id: 9 }.to_response();
        let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "developer with id 9 not found");
    }
}
