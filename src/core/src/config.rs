//! Construction parameters for a ledger.

use crate::errors::LedgerError;
use crate::types::Amount;
use serde::{Deserialize, Serialize};

/// The two immutable limits a ledger is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Maximum total value the ledger may ever hold
    pub global_cap: Amount,
    /// Maximum value any single withdrawal may move out
    pub withdraw_cap: Amount,
}

impl LedgerConfig {
    /// Creates a configuration, rejecting zero limits.
    pub fn new(global_cap: Amount, withdraw_cap: Amount) -> Result<Self, LedgerError> {
        let config = Self {
            global_cap,
            withdraw_cap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that both limits are positive.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.global_cap == 0 {
            return Err(LedgerError::InvalidConfig(
                "global_cap must be greater than zero".to_string(),
            ));
        }
        if self.withdraw_cap == 0 {
            return Err(LedgerError::InvalidConfig(
                "withdraw_cap must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
