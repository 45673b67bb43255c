//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dyn_balancer_connections_opened_total` (counter): handles created
//! - `dyn_balancer_connections_evicted_total` (counter): handles released
//! - `dyn_balancer_republish_total` (counter): (state, picker) publications
//! - `dyn_balancer_ready_connections` (gauge): handles served by the picker
//! - `dyn_balancer_watch_errors_total` (counter): failed provider fetches
//! - `dyn_balancer_snapshots_total` (counter): non-empty snapshots received
//! - `dyn_balancer_snapshot_endpoints` (gauge): size of the latest snapshot
//!
//! Every metric carries a `service` label.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::balancer::state::AggregatedState;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_connection_opened(service: &str) {
    ::metrics::counter!("dyn_balancer_connections_opened_total", "service" => service.to_string())
        .increment(1);
}

pub fn record_eviction(service: &str) {
    ::metrics::counter!("dyn_balancer_connections_evicted_total", "service" => service.to_string())
        .increment(1);
}

pub fn record_republish(service: &str, state: AggregatedState, ready: usize) {
    ::metrics::counter!(
        "dyn_balancer_republish_total",
        "service" => service.to_string(),
        "state" => state.to_string()
    )
    .increment(1);
    ::metrics::gauge!("dyn_balancer_ready_connections", "service" => service.to_string())
        .set(ready as f64);
}

pub fn record_watch_error(service: &str) {
    ::metrics::counter!("dyn_balancer_watch_errors_total", "service" => service.to_string())
        .increment(1);
}

pub fn record_snapshot(service: &str, endpoints: usize) {
    ::metrics::counter!("dyn_balancer_snapshots_total", "service" => service.to_string())
        .increment(1);
    ::metrics::gauge!("dyn_balancer_snapshot_endpoints", "service" => service.to_string())
        .set(endpoints as f64);
}
