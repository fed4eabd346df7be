//! Metrics collection and exposition.
//!
//! # Metrics
//! - `routing_resolutions_total` (counter): resolutions by outcome
//!   (`no_match`, `suppressed`, `routed`)
//! - `routing_errors_total` (counter): failed resolutions by kind
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter is optional (`observability.metrics_enabled`)

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_resolution(outcome: &'static str) {
    ::metrics::counter!("routing_resolutions_total", "outcome" => outcome).increment(1);
}

pub fn record_routing_error(kind: &'static str) {
    ::metrics::counter!("routing_errors_total", "kind" => kind).increment(1);
}
