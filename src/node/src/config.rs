//! Configuration for the node daemon.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use vault_core::LedgerConfig;

use crate::errors::NodeError;

/// Configuration for the node daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Ledger limits
    pub ledger: LedgerConfig,
    /// RPC configuration
    pub rpc: RpcConfig,
    /// Metrics configuration
    pub metrics: MetricsConfig,
    /// Payout configuration
    pub payout: PayoutConfig,
}

/// RPC configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Listen address for the RPC server
    pub listen_addr: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether to enable the metrics server
    pub enabled: bool,
    /// Listen address for the metrics server
    pub listen_addr: String,
}

/// Payout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutConfig {
    /// Webhook that settles withdrawals; payouts are only logged when unset
    pub endpoint: Option<String>,
    /// How long a payout may take before it is treated as failed
    pub timeout_ms: u64,
}

impl PayoutConfig {
    /// The payout timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            ledger: LedgerConfig {
                global_cap: 1_000_000,
                withdraw_cap: 10_000,
            },
            rpc: RpcConfig {
                listen_addr: "127.0.0.1:8545".to_string(),
            },
            metrics: MetricsConfig {
                enabled: false,
                listen_addr: "127.0.0.1:9090".to_string(),
            },
            payout: PayoutConfig {
                endpoint: None,
                timeout_ms: 5_000,
            },
        }
    }
}

impl NodeConfig {
    /// Loads configuration from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: NodeConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Checks the ledger limits and the payout timeout.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.ledger.validate()?;

        if self.payout.timeout_ms == 0 {
            return Err(NodeError::ConfigError(
                "payout.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
