//! Metrics collection and exposition.
//!
//! # Metrics
//! - `appserve_requests_total` (counter): responses by route kind, status
//! - `appserve_request_duration_seconds` (histogram): time per connection
//! - `appserve_active_connections` (gauge): current connection count
//! - `appserve_accept_errors_total` (counter): failed accepts
//! - `appserve_handler_failures_total` (counter): dynamic handler errors
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for route kind and status code only; request paths are never
//!   used as labels

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a written response.
pub fn record_request(kind: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "appserve_requests_total",
        "kind" => kind,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("appserve_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

pub fn connection_opened() {
    metrics::gauge!("appserve_active_connections").increment(1.0);
}

pub fn connection_closed() {
    metrics::gauge!("appserve_active_connections").decrement(1.0);
}

pub fn record_accept_error() {
    metrics::counter!("appserve_accept_errors_total").increment(1);
}

pub fn record_handler_failure() {
    metrics::counter!("appserve_handler_failures_total").increment(1);
}
