//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, optional connection limit)
//!     → connection.rs (active-connection tracking, state machine)
//!     → Hand off to server::handler
//!
//! Connection States:
//!     Reading → Routing → Responding → Closed
//! ```
//!
//! # Design Decisions
//! - Unbounded by default; a single config value bounds admission
//! - Each connection is counted from handler start to handler end
//! - Counting is RAII so every exit path decrements exactly once

pub mod connection;
pub mod listener;
