//! Error types for the node daemon.

use std::error::Error as StdError;
use std::fmt;
use vault_core::LedgerError;

/// Errors that can occur in the node daemon.
#[derive(Debug)]
pub enum NodeError {
    /// Error when a ledger operation fails.
    LedgerError(LedgerError),

    /// Error when an RPC operation fails.
    RpcError(String),

    /// Error when a metrics operation fails.
    MetricsError(String),

    /// Error when a configuration operation fails.
    ConfigError(String),

    /// Error when the payout client cannot be built.
    PayoutError(String),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::LedgerError(e) => write!(f, "Ledger error: {}", e),
            NodeError::RpcError(msg) => write!(f, "RPC error: {}", msg),
            NodeError::MetricsError(msg) => write!(f, "Metrics error: {}", msg),
            NodeError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            NodeError::PayoutError(msg) => write!(f, "Payout error: {}", msg),
        }
    }
}

impl StdError for NodeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            NodeError::LedgerError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LedgerError> for NodeError {
    fn from(error: LedgerError) -> Self {
        NodeError::LedgerError(error)
    }
}
