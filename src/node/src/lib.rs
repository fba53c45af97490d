//! Node daemon for the capped custodial vault.
//!
//! Hosts a single [`vault_core::Ledger`] behind a JSON-RPC endpoint, settles
//! withdrawals through a configurable payout webhook and exports prometheus
//! metrics.

pub mod config;
pub mod errors;
pub mod metrics;
pub mod rpc;
pub mod settlement;

use config::NodeConfig;
use errors::NodeError;
use metrics::MetricsSink;
use rpc::NodeLedger;
use settlement::Settlement;
use std::sync::Arc;

/// Builds the ledger described by `config`.
pub fn build_ledger(config: &NodeConfig) -> Result<Arc<NodeLedger>, NodeError> {
    config.validate()?;

    let settlement = Settlement::from_config(&config.payout)?;
    let ledger = NodeLedger::new(config.ledger, settlement, MetricsSink)?;

    Ok(Arc::new(ledger))
}
