//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build repositories → Register controllers → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     stop() → Stop accepting → Close listener → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → stop()
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then storage, then listener
//! - One explicit composition root; no lazy globals
//! - Shutdown has timeout: in-flight connections get a bounded drain

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_router, StartupError};
