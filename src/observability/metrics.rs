//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tracker_nodes_created_total` (counter): nodes spawned, by kind
//! - `tracker_nodes_retired_total` (counter): nodes evicted from the registry
//! - `tracker_nodes_live` (gauge): node loops currently running
//! - `tracker_messages_total` (counter): mailbox messages applied, by message
//! - `tracker_unbinds_total` (counter): binding ends, by intent
//! - `tracker_type_mismatches_total` (counter): updates rejected for kind
//! - `tracker_detached_messages_total` (counter): sends that hit a retired node
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; without an installed recorder
//!   every call is a no-op, so library users pay nothing by default
//! - Tracker values themselves are not exported here

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_node_created(kind: &'static str) {
    metrics::counter!("tracker_nodes_created_total", "kind" => kind).increment(1);
    metrics::gauge!("tracker_nodes_live").increment(1.0);
}

pub fn record_node_stopped() {
    metrics::gauge!("tracker_nodes_live").decrement(1.0);
}

pub fn record_node_retired() {
    metrics::counter!("tracker_nodes_retired_total").increment(1);
}

pub fn record_message(message: &'static str) {
    metrics::counter!("tracker_messages_total", "message" => message).increment(1);
}

pub fn record_unbind(intent: &'static str) {
    metrics::counter!("tracker_unbinds_total", "intent" => intent).increment(1);
}

pub fn record_type_mismatch() {
    metrics::counter!("tracker_type_mismatches_total").increment(1);
}

pub fn record_detached_message() {
    metrics::counter!("tracker_detached_messages_total").increment(1);
}
