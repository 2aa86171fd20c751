//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): forwarded requests by method, status
//! - `relay_request_duration_seconds` (histogram): forwarding latency
//! - `relay_upstream_errors_total` (counter): synthesized failures by kind
//! - `relay_upstream_healthy` (gauge): 1=last probe succeeded, 0=failed
//! - `relay_probe_duration_seconds` (histogram): probe latency
//!
//! Without an installed exporter every call here is a no-op.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "relay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("relay_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("relay_upstream_errors_total", "kind" => kind).increment(1);
}

pub fn record_probe(success: bool, latency: Duration) {
    gauge!("relay_upstream_healthy").set(if success { 1.0 } else { 0.0 });
    histogram!("relay_probe_duration_seconds").record(latency.as_secs_f64());
}
