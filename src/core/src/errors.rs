//! Error types for the core crate.

use crate::types::{Account, Amount};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while operating on the ledger.
///
/// Every variant is a rejection of the whole operation: no variant is ever
/// returned after a partial application of effects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The amount was zero, or value arrived outside of `deposit`.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// A deposit would push total holdings above the global cap.
    #[error("Deposit of {requested} exceeds remaining capacity of {remaining}")]
    CapacityExceeded {
        /// The amount being deposited
        requested: Amount,
        /// The capacity left under the global cap
        remaining: Amount,
    },

    /// A withdrawal exceeds the caller's own balance.
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// The amount being withdrawn
        requested: Amount,
        /// The caller's balance
        available: Amount,
    },

    /// A withdrawal exceeds the per-operation cap.
    #[error("Withdrawal of {requested} exceeds the per-withdrawal limit of {limit}")]
    WithdrawLimitExceeded {
        /// The amount being withdrawn
        requested: Amount,
        /// The per-withdrawal cap
        limit: Amount,
    },

    /// The external value transfer did not succeed.
    #[error("Transfer of {amount} to {recipient} failed: {source}")]
    TransferFailed {
        /// The account that should have received the value
        recipient: Account,
        /// The amount that was being moved
        amount: Amount,
        /// Why the transfer primitive gave up
        source: TransferError,
    },

    /// Checked arithmetic on a balance, total or counter failed.
    #[error("Ledger arithmetic overflow")]
    Overflow,

    /// The construction parameters are unusable.
    #[error("Invalid ledger configuration: {0}")]
    InvalidConfig(String),
}

impl LedgerError {
    /// Stable, machine-readable name of the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::ZeroAmount => "zero_amount",
            LedgerError::CapacityExceeded { .. } => "capacity_exceeded",
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::WithdrawLimitExceeded { .. } => "withdraw_limit_exceeded",
            LedgerError::TransferFailed { .. } => "transfer_failed",
            LedgerError::Overflow => "overflow",
            LedgerError::InvalidConfig(_) => "invalid_config",
        }
    }
}

/// Errors reported by a [`ValueTransfer`](crate::transfer::ValueTransfer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The recipient refused the value.
    #[error("Recipient rejected the transfer: {0}")]
    Rejected(String),

    /// The recipient did not answer within the allowed time.
    #[error("Transfer timed out after {0:?}")]
    TimedOut(Duration),

    /// The transfer channel could not be reached.
    #[error("Transfer channel unavailable: {0}")]
    Unavailable(String),
}

/// Error returned when parsing an [`Account`] from text fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseAccountError {
    /// The text is not valid hex.
    #[error("Invalid account hex: {0}")]
    InvalidHex(String),

    /// The decoded identity has the wrong length.
    #[error("Invalid account length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}
