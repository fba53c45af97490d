//! Mutable ledger state and its checked transitions.
//!
//! Every transition computes all of its new values before writing any of
//! them, so a failed transition leaves the state untouched.

use crate::errors::LedgerError;
use crate::types::{Account, Amount, Counter};
use std::collections::HashMap;

/// Balances, totals and counters owned by a ledger.
#[derive(Debug, Default)]
pub(crate) struct LedgerState {
    /// Sum of all balances
    total_deposited: Amount,
    /// Value debited by withdrawals whose transfer has not resolved yet
    in_flight: Amount,
    /// Balance per account
    balances: HashMap<Account, Amount>,
    /// Successful deposits
    deposit_count: Counter,
    /// Successful withdrawals
    withdraw_count: Counter,
}

impl LedgerState {
    pub(crate) fn balance_of(&self, account: &Account) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub(crate) fn total_deposited(&self) -> Amount {
        self.total_deposited
    }

    pub(crate) fn in_flight(&self) -> Amount {
        self.in_flight
    }

    pub(crate) fn deposit_count(&self) -> Counter {
        self.deposit_count
    }

    pub(crate) fn withdraw_count(&self) -> Counter {
        self.withdraw_count
    }

    pub(crate) fn accounts(&self) -> usize {
        self.balances.len()
    }

    /// Value currently held in custody, including in-flight payouts.
    pub(crate) fn held(&self) -> Result<Amount, LedgerError> {
        self.total_deposited
            .checked_add(self.in_flight)
            .ok_or(LedgerError::Overflow)
    }

    /// Credits a deposit and counts it.
    pub(crate) fn apply_deposit(
        &mut self,
        account: &Account,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let total = self
            .total_deposited
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let count = self
            .deposit_count
            .checked_add(1)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(*account, balance);
        self.total_deposited = total;
        self.deposit_count = count;
        Ok(())
    }

    /// Debits a withdrawal and marks the amount as in flight.
    pub(crate) fn begin_withdrawal(
        &mut self,
        account: &Account,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.balance_of(account);
        let balance = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                requested: amount,
                available,
            })?;
        let total = self
            .total_deposited
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        let in_flight = self
            .in_flight
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(*account, balance);
        self.total_deposited = total;
        self.in_flight = in_flight;
        Ok(())
    }

    /// Settles a paid-out withdrawal and counts it.
    pub(crate) fn complete_withdrawal(&mut self, amount: Amount) -> Result<(), LedgerError> {
        let in_flight = self
            .in_flight
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;
        let count = self
            .withdraw_count
            .checked_add(1)
            .ok_or(LedgerError::Overflow)?;

        self.in_flight = in_flight;
        self.withdraw_count = count;
        Ok(())
    }

    /// Re-credits a withdrawal whose payout failed.
    pub(crate) fn cancel_withdrawal(
        &mut self,
        account: &Account,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let total = self
            .total_deposited
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;
        let in_flight = self
            .in_flight
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(*account, balance);
        self.total_deposited = total;
        self.in_flight = in_flight;
        Ok(())
    }

    /// Whether the total matches the sum of the balances.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let sum = self
            .balances
            .values()
            .try_fold(0u128, |acc, bal| acc.checked_add(*bal));
        sum == Some(self.total_deposited)
    }
}
