//! Metrics for the node daemon.

use crate::errors::NodeError;
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_gauge, register_histogram, register_int_counter,
    register_int_counter_vec, Counter, Encoder, Gauge, Histogram, HistogramOpts, IntCounter,
    IntCounterVec, Opts,
};
use std::net::SocketAddr;
use tracing::{error, info};
use vault_core::{EventSink, LedgerError, LedgerEvent, TracingSink};
use warp::Filter;

lazy_static! {
    /// Counter for the number of successful deposits.
    pub static ref DEPOSITS_TOTAL: IntCounter = register_int_counter!(
        Opts::new("vault_deposits_total", "Total number of successful deposits")
    )
    .expect("deposit counter registers once");

    /// Counter for the number of successful withdrawals.
    pub static ref WITHDRAWALS_TOTAL: IntCounter = register_int_counter!(
        Opts::new("vault_withdrawals_total", "Total number of successful withdrawals")
    )
    .expect("withdrawal counter registers once");

    /// Counter for the value credited by deposits.
    pub static ref DEPOSITED_VALUE: Counter = register_counter!(
        Opts::new("vault_deposited_value_total", "Total value credited by deposits")
    )
    .expect("deposited value counter registers once");

    /// Counter for the value paid out by withdrawals.
    pub static ref WITHDRAWN_VALUE: Counter = register_counter!(
        Opts::new("vault_withdrawn_value_total", "Total value paid out by withdrawals")
    )
    .expect("withdrawn value counter registers once");

    /// Counter for rejected operations, by operation and error kind.
    pub static ref REJECTIONS: IntCounterVec = register_int_counter_vec!(
        Opts::new("vault_rejections_total", "Total number of rejected ledger operations"),
        &["operation", "kind"]
    )
    .expect("rejection counter registers once");

    /// Gauge for the value currently tracked by balances.
    pub static ref TOTAL_DEPOSITED: Gauge = register_gauge!(
        Opts::new("vault_total_deposited", "Sum of all account balances")
    )
    .expect("total deposited gauge registers once");

    /// Histogram for RPC request handling time.
    pub static ref RPC_TIME: Histogram = register_histogram!(
        HistogramOpts::new(
            "vault_rpc_request_seconds",
            "Time to handle a JSON-RPC request"
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    )
    .expect("rpc histogram registers once");
}

/// Registers all metrics with the default registry.
pub fn register_metrics() {
    lazy_static::initialize(&DEPOSITS_TOTAL);
    lazy_static::initialize(&WITHDRAWALS_TOTAL);
    lazy_static::initialize(&DEPOSITED_VALUE);
    lazy_static::initialize(&WITHDRAWN_VALUE);
    lazy_static::initialize(&REJECTIONS);
    lazy_static::initialize(&TOTAL_DEPOSITED);
    lazy_static::initialize(&RPC_TIME);
}

/// Counts a rejected ledger operation.
pub fn record_rejection(operation: &str, error: &LedgerError) {
    REJECTIONS.with_label_values(&[operation, error.kind()]).inc();
}

/// Event sink that updates the counters and logs every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsSink;

impl EventSink for MetricsSink {
    fn publish(&self, event: &LedgerEvent) {
        let value = event.amount() as f64;
        match event {
            LedgerEvent::Deposited { .. } => {
                DEPOSITS_TOTAL.inc();
                DEPOSITED_VALUE.inc_by(value);
            }
            LedgerEvent::Withdrawn { .. } => {
                WITHDRAWALS_TOTAL.inc();
                WITHDRAWN_VALUE.inc_by(value);
            }
        }
        TracingSink.publish(event);
    }
}

/// Renders the default registry in the text exposition format.
pub fn gather_text() -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Starts the metrics server on `listen_addr` and returns the bound address.
pub async fn start_metrics_server(listen_addr: &str) -> Result<SocketAddr, NodeError> {
    let addr: SocketAddr = listen_addr.parse().map_err(|e| {
        NodeError::MetricsError(format!("Invalid listen address {}: {}", listen_addr, e))
    })?;

    let metrics_route = warp::path("metrics").map(gather_text);
    let (bound, server) = warp::serve(metrics_route)
        .try_bind_ephemeral(addr)
        .map_err(|e| NodeError::MetricsError(format!("Failed to bind {}: {}", addr, e)))?;
    tokio::spawn(server);

    info!("Metrics server listening on {}", bound);
    Ok(bound)
}
