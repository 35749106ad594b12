//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method and status
//! - `gateway_auth_rejections_total` (counter): rejections by reason
//! - `gateway_upstream_header_seconds` (histogram): wait for backend headers
//! - `gateway_relay_bytes_total` (counter): body bytes relayed to clients
//! - `gateway_relay_interrupted_total` (counter): truncated relays by side
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint started");
    Ok(())
}

pub fn record_request(method: &str, status: u16) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_auth_rejection(reason: &'static str) {
    counter!("gateway_auth_rejections_total", "reason" => reason).increment(1);
}

pub fn record_upstream_header_latency(started: Instant) {
    histogram!("gateway_upstream_header_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_relayed_bytes(bytes: u64) {
    counter!("gateway_relay_bytes_total").increment(bytes);
}

/// `side` is `"backend"` or `"client"`.
pub fn record_stream_interrupted(side: &'static str) {
    counter!("gateway_relay_interrupted_total", "side" => side).increment(1);
}
