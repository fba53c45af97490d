//! Core of the capped custodial vault.
//!
//! This crate provides the single-asset [`Ledger`] state machine together with
//! the seams it talks to the outside world through: the [`ValueTransfer`]
//! primitive that pays out withdrawals and the [`EventSink`] that receives
//! notifications.

pub mod config;
pub mod errors;
pub mod events;
pub mod ledger;
mod state;
pub mod transfer;
pub mod types;

// Re-export commonly used types
pub use config::LedgerConfig;
pub use errors::{LedgerError, ParseAccountError, TransferError};
pub use events::{EventSink, TracingSink};
pub use ledger::Ledger;
pub use transfer::ValueTransfer;
pub use types::{Account, Amount, Counter, LedgerEvent, LedgerStats};
