//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by delivery mode and status
//! - `proxy_request_duration_seconds` (histogram): time to response headers
//! - `proxy_upstream_connections_total` (counter): upstream connections opened
//! - `proxy_upstream_connections_active` (gauge): upstream connections open now
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(mode: &'static str, status: u16, start: Instant) {
    counter!("proxy_requests_total", "mode" => mode, "status" => status.to_string()).increment(1);
    histogram!("proxy_request_duration_seconds", "mode" => mode)
        .record(start.elapsed().as_secs_f64());
}

pub fn upstream_connection_opened() {
    counter!("proxy_upstream_connections_total").increment(1);
    gauge!("proxy_upstream_connections_active").increment(1.0);
}

pub fn upstream_connection_closed() {
    gauge!("proxy_upstream_connections_active").decrement(1.0);
}
