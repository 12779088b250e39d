//! Metrics collection and exposition.
//!
//! # Metrics
//! - `catalog_requests_total` (counter): requests by method, status
//!   (method is `UNKNOWN` for requests rejected before a method was parsed)
//! - `catalog_request_duration_seconds` (histogram): latency distribution
//! - `catalog_active_connections` (gauge): current connection count

use std::net::SocketAddr;
use std::time::Instant;

use http::{Method, StatusCode};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

const REQUESTS_TOTAL: &str = "catalog_requests_total";
const REQUEST_DURATION: &str = "catalog_request_duration_seconds";
const ACTIVE_CONNECTIONS: &str = "catalog_active_connections";

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

const UNKNOWN_METHOD: &str = "UNKNOWN";

/// Record one answered request.
pub fn record_request(method: &Method, status: StatusCode, started: Instant) {
    record(method.as_str(), status, started);
}

/// Record a request answered with 400 because it could not be parsed.
pub fn record_malformed(started: Instant) {
    record(UNKNOWN_METHOD, StatusCode::BAD_REQUEST, started);
}

fn record(method: &str, status: StatusCode, started: Instant) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!(REQUEST_DURATION).record(started.elapsed().as_secs_f64());
}

pub fn connection_opened() {
    metrics::gauge!(ACTIVE_CONNECTIONS).increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!(ACTIVE_CONNECTIONS).decrement(1.0);
}

/// Overwrite the gauge with an authoritative count.
pub fn record_active_connections(count: u64) {
    metrics::gauge!(ACTIVE_CONNECTIONS).set(count as f64);
}
