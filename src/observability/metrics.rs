//! Metrics collection and exposition.
//!
//! # Metrics
//! - `balancer_requests_total` (counter): inbound requests by route, status
//! - `balancer_request_duration_seconds` (histogram): handler latency by route
//! - `balancer_active_connections` (gauge): open client connections
//! - `balancer_jobs_enqueued_total` (counter): jobs accepted on the write path
//! - `balancer_jobs_delivered_total` (counter): dispatches that got a response, by status
//! - `balancer_jobs_dropped_total` (counter): abandoned dispatches, by reason
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!("balancer_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
    histogram!("balancer_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn set_active_connections(count: u64) {
    gauge!("balancer_active_connections").set(count as f64);
}

pub fn record_job_enqueued() {
    counter!("balancer_jobs_enqueued_total").increment(1);
}

pub fn record_job_delivered(status: u16) {
    counter!("balancer_jobs_delivered_total", "status" => status.to_string()).increment(1);
}

pub fn record_job_dropped(reason: &'static str) {
    counter!("balancer_jobs_dropped_total", "reason" => reason).increment(1);
}
