//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ledger_cache_status` (gauge): 0=disconnected, 1=connecting, 2=ready, 3=degraded
//! - `ledger_cache_errors_total` (counter): errors seen on the long-lived connection
//! - `ledger_health_probes_total` (counter): health probes by outcome
//! - `ledger_execution_mode` (gauge): 1 for the selected mode label
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus exporter is optional and bound to its own address

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::cache::ConnectionStatus;
use crate::environment::ExecutionMode;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cache_status(status: ConnectionStatus) {
    let value = match status {
        ConnectionStatus::Disconnected => 0.0,
        ConnectionStatus::Connecting => 1.0,
        ConnectionStatus::Ready => 2.0,
        ConnectionStatus::Degraded => 3.0,
    };
    gauge!("ledger_cache_status").set(value);
}

pub fn record_cache_error() {
    counter!("ledger_cache_errors_total").increment(1);
}

pub fn record_health_probe(outcome: &'static str) {
    counter!("ledger_health_probes_total", "outcome" => outcome).increment(1);
}

pub fn record_execution_mode(mode: ExecutionMode) {
    gauge!("ledger_execution_mode", "mode" => mode.to_string()).set(1.0);
}
