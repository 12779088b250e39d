//! Message model subsystem.
//!
//! # Data Flow
//! ```text
//! TCP stream
//!     → codec.rs (read_request: request line, headers, Content-Length body)
//!     → Request (immutable)
//!     → [router / controller]
//!     → Response (built once)
//!     → codec.rs (encode_response: status line, headers, blank line, body)
//!     → TCP stream
//! ```
//!
//! # Design Decisions
//! - Method, status and header types come from the `http` crate
//! - Header names are case-insensitive by construction (`HeaderMap`)
//! - Only HTTP/1.x, one request per connection

pub mod codec;
pub mod request;
pub mod response;

pub use codec::{encode_response, parse_request, read_request, ParseError, ParseLimits};
pub use request::Request;
pub use response::Response;
