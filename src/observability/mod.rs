//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Background:
//!     → monitor.rs (periodic active-connection report)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (method, path, status, connection_id) on every event
//! - Metrics are cheap no-ops until a recorder is installed
//! - Nothing on the request path depends on the monitor running

pub mod logging;
pub mod metrics;
pub mod monitor;

pub use monitor::ConnectionMonitor;
