//! The custodial ledger.
//!
//! A [`Ledger`] tracks per-account balances of a single asset. Deposits are
//! bounded by a global cap on total holdings, withdrawals by a
//! per-operation cap. Withdrawals follow checks-effects-interactions: the
//! balance is debited before the [`ValueTransfer`] is invoked, so a
//! recipient that calls back into the ledger sees the reduced balance and
//! cannot withdraw the same funds twice.
//!
//! All operations are serialised by one re-entrant lock. A withdrawal keeps
//! the lock across its payout, so other threads wait while a recipient on
//! the paying thread may still re-enter.

use crate::config::LedgerConfig;
use crate::errors::LedgerError;
use crate::events::{EventSink, TracingSink};
use crate::state::LedgerState;
use crate::transfer::ValueTransfer;
use crate::types::{Account, Amount, Counter, LedgerEvent, LedgerStats};
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use tracing::{debug, info, warn};

/// A single-asset custodial ledger.
pub struct Ledger<T, S = TracingSink> {
    /// Immutable limits
    config: LedgerConfig,
    /// Balances and counters; the cell is never borrowed across external calls
    state: ReentrantMutex<RefCell<LedgerState>>,
    /// Pays out withdrawals
    transfer: T,
    /// Receives notifications of successful mutations
    sink: S,
}

impl<T: ValueTransfer> Ledger<T, TracingSink> {
    /// Creates a ledger that logs its events.
    pub fn with_transfer(config: LedgerConfig, transfer: T) -> Result<Self, LedgerError> {
        Self::new(config, transfer, TracingSink)
    }
}

impl<T: ValueTransfer, S: EventSink> Ledger<T, S> {
    /// Creates an empty ledger with the given limits and collaborators.
    pub fn new(config: LedgerConfig, transfer: T, sink: S) -> Result<Self, LedgerError> {
        config.validate()?;

        info!(
            global_cap = %config.global_cap,
            withdraw_cap = %config.withdraw_cap,
            "Ledger created"
        );

        Ok(Self {
            config,
            state: ReentrantMutex::new(RefCell::new(LedgerState::default())),
            transfer,
            sink,
        })
    }

    /// Credits `amount` to `account`.
    ///
    /// Fails with [`LedgerError::ZeroAmount`] for a zero amount and with
    /// [`LedgerError::CapacityExceeded`] if the deposit would take holdings
    /// above the global cap. On failure nothing changes.
    pub fn deposit(&self, account: &Account, amount: Amount) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();

            // In-flight payouts are still in custody and keep their share of the cap
            let remaining = self.config.global_cap.saturating_sub(state.held()?);
            if amount > remaining {
                debug!(%account, amount = %amount, remaining = %remaining, "Deposit over capacity");
                return Err(LedgerError::CapacityExceeded {
                    requested: amount,
                    remaining,
                });
            }

            state.apply_deposit(account, amount)?;
        }

        self.sink.publish(&LedgerEvent::Deposited {
            account: *account,
            amount,
        });
        Ok(())
    }

    /// Debits `amount` from `account` and pays it out through the transfer
    /// primitive.
    ///
    /// Checks run in a fixed order: balance first, then the per-withdrawal
    /// cap. If the payout fails the debit is reversed and
    /// [`LedgerError::TransferFailed`] is returned. A payout that panics has
    /// its debit reversed the same way before the panic propagates.
    pub fn withdraw(&self, account: &Account, amount: Amount) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }

        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();

            let available = state.balance_of(account);
            if amount > available {
                return Err(LedgerError::InsufficientBalance {
                    requested: amount,
                    available,
                });
            }
            if amount > self.config.withdraw_cap {
                return Err(LedgerError::WithdrawLimitExceeded {
                    requested: amount,
                    limit: self.config.withdraw_cap,
                });
            }

            state.begin_withdrawal(account, amount)?;
        }

        debug!(%account, amount = %amount, "Balance debited, paying out");

        let pending = PendingPayout {
            state: &guard,
            account: *account,
            amount,
            armed: true,
        };
        let outcome = self.transfer.transfer(account, amount);
        pending.disarm();

        if let Err(source) = outcome {
            guard.borrow_mut().cancel_withdrawal(account, amount)?;
            warn!(
                %account,
                amount = %amount,
                error = %source,
                "Payout failed, withdrawal reverted"
            );
            return Err(LedgerError::TransferFailed {
                recipient: *account,
                amount,
                source,
            });
        }

        guard.borrow_mut().complete_withdrawal(amount)?;

        self.sink.publish(&LedgerEvent::Withdrawn {
            account: *account,
            amount,
        });
        Ok(())
    }

    /// Rejects value handed to the ledger outside of [`deposit`](Self::deposit).
    ///
    /// Such value would sit in custody without being tracked by any balance,
    /// so it is always refused with [`LedgerError::ZeroAmount`].
    pub fn receive(&self, sender: &Account, amount: Amount) -> Result<(), LedgerError> {
        warn!(%sender, amount = %amount, "Rejected value sent outside of deposit");
        Err(LedgerError::ZeroAmount)
    }

    /// Returns the balance of `account`, zero if it never deposited.
    pub fn balance_of(&self, account: &Account) -> Amount {
        self.state.lock().borrow().balance_of(account)
    }

    /// Returns the sum of all balances.
    pub fn total_deposited(&self) -> Amount {
        self.state.lock().borrow().total_deposited()
    }

    /// Returns how much more may be deposited before hitting the global cap.
    pub fn remaining_capacity(&self) -> Amount {
        let guard = self.state.lock();
        let state = guard.borrow();
        self.config
            .global_cap
            .saturating_sub(state.total_deposited().saturating_add(state.in_flight()))
    }

    /// Returns the number of successful deposits.
    pub fn deposit_count(&self) -> Counter {
        self.state.lock().borrow().deposit_count()
    }

    /// Returns the number of successful withdrawals.
    pub fn withdraw_count(&self) -> Counter {
        self.state.lock().borrow().withdraw_count()
    }

    /// Takes a consistent snapshot of the aggregate state.
    pub fn stats(&self) -> LedgerStats {
        let guard = self.state.lock();
        let state = guard.borrow();
        LedgerStats {
            global_cap: self.config.global_cap,
            withdraw_cap: self.config.withdraw_cap,
            total_deposited: state.total_deposited(),
            remaining_capacity: self
                .config
                .global_cap
                .saturating_sub(state.total_deposited().saturating_add(state.in_flight())),
            deposit_count: state.deposit_count(),
            withdraw_count: state.withdraw_count(),
            accounts: state.accounts(),
        }
    }

    /// Returns the limits the ledger was created with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn global_cap(&self) -> Amount {
        self.config.global_cap
    }

    pub fn withdraw_cap(&self) -> Amount {
        self.config.withdraw_cap
    }

    /// Returns the transfer primitive.
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        self.state.lock().borrow().is_consistent()
    }
}

/// Re-credits a debited withdrawal if the payout unwinds instead of returning.
struct PendingPayout<'a> {
    state: &'a RefCell<LedgerState>,
    account: Account,
    amount: Amount,
    armed: bool,
}

impl PendingPayout<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingPayout<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let restored = self
            .state
            .try_borrow_mut()
            .map(|mut state| state.cancel_withdrawal(&self.account, self.amount).is_ok())
            .unwrap_or(false);
        warn!(
            account = %self.account,
            amount = %self.amount,
            restored,
            "Payout panicked, withdrawal reverted"
        );
    }
}
