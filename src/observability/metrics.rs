//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lb_requests_total` (counter): requests answered, by status
//! - `lb_request_duration_seconds` (histogram): end-to-end latency
//! - `lb_forward_errors_total` (counter): transport failures, by backend
//! - `lb_backend_up` (gauge): 1=alive, 0=dead, by backend
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("lb_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("lb_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_forward_error(backend: &str) {
    metrics::counter!("lb_forward_errors_total", "backend" => backend.to_string()).increment(1);
}

pub fn record_backend_health(backend: &str, alive: bool) {
    metrics::gauge!("lb_backend_up", "backend" => backend.to_string())
        .set(if alive { 1.0 } else { 0.0 });
}
