//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pipeline_dispatch_total` (counter): handler runs by route, outcome
//! - `pipeline_fetch_duration_seconds` (histogram): backend latency by method
//! - `pipeline_cache_ops_total` (counter): cache calls by op, outcome
//! - `pipeline_cache_swept_total` (counter): entries removed on expiry
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels stay low-cardinality: route patterns, never identifiers

use std::net::SocketAddr;
use std::time::Instant;

use ::metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// One handler run for `route` ("none" when nothing matched).
pub fn record_dispatch(route: &str, outcome: &'static str) {
    counter!(
        "pipeline_dispatch_total",
        "route" => route.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// One completed backend fetch.
pub fn record_fetch(method: &'static str, start: Instant) {
    histogram!("pipeline_fetch_duration_seconds", "method" => method).record(start.elapsed().as_secs_f64());
}

pub fn record_cache_op(op: &'static str, outcome: &'static str) {
    counter!("pipeline_cache_ops_total", "op" => op, "outcome" => outcome).increment(1);
}

pub fn record_cache_swept(count: usize) {
    counter!("pipeline_cache_swept_total").increment(count as u64);
}
