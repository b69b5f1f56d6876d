//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forward_proxy_requests_total` (counter): exchanges by method, status, outcome
//! - `forward_proxy_request_duration_seconds` (histogram): time to response head
//! - `forward_proxy_relayed_bytes_total` (counter): response body bytes relayed
//! - `forward_proxy_stream_failures_total` (counter): origin bodies that failed mid-relay
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - Labels stay low-cardinality: no paths, no override hosts

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::error::Error;

/// Install the Prometheus exporter with an HTTP scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Error> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| Error::Metrics(e.to_string()))?;

    describe_counter!(
        "forward_proxy_requests_total",
        "Forwarded exchanges by method, status and outcome"
    );
    describe_histogram!(
        "forward_proxy_request_duration_seconds",
        "Time from request receipt to origin response head"
    );
    describe_counter!(
        "forward_proxy_relayed_bytes_total",
        "Response body bytes relayed to callers"
    );
    describe_counter!(
        "forward_proxy_stream_failures_total",
        "Origin bodies that failed after the response head was sent"
    );

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished exchange (response head sent or failed).
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "forward_proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "forward_proxy_request_duration_seconds",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_relayed_bytes(bytes: u64) {
    counter!("forward_proxy_relayed_bytes_total").increment(bytes);
}

pub fn record_stream_failure() {
    counter!("forward_proxy_stream_failures_total").increment(1);
}
