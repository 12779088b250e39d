//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Request (method, path)
//!     → POST /disconnect? → delayed "ACK"
//!     → first path segment, lower-cased
//!     → route table lookup
//!     → Controller::handle | 404
//!
//! Route table (at startup):
//!     composition root registers one controller per resource
//!     → Router moved into an Arc, never mutated again
//! ```
//!
//! # Design Decisions
//! - Registered once at startup, immutable at runtime (no locks)
//! - Case-insensitive on the resource segment only
//! - An unknown resource is a plain 404 response, not a failure
//! - Controller failures pass through untouched

pub mod router;

pub use router::{Router, RouterError, DISCONNECT_PATH};
