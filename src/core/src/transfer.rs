//! The value-transfer primitive the ledger pays withdrawals through.

use crate::errors::TransferError;
use crate::types::{Account, Amount};
use std::sync::Arc;

/// Moves value out of custody to a recipient.
///
/// The ledger calls this only after its own state already reflects the
/// withdrawal. Implementations may run arbitrary code, including calling
/// back into the same ledger, and must give up in bounded time.
pub trait ValueTransfer: Send + Sync {
    /// Attempts to move `amount` to `recipient`.
    fn transfer(&self, recipient: &Account, amount: Amount) -> Result<(), TransferError>;
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for Arc<T> {
    fn transfer(&self, recipient: &Account, amount: Amount) -> Result<(), TransferError> {
        (**self).transfer(recipient, amount)
    }
}

impl<T: ValueTransfer + ?Sized> ValueTransfer for Box<T> {
    fn transfer(&self, recipient: &Account, amount: Amount) -> Result<(), TransferError> {
        (**self).transfer(recipient, amount)
    }
}
