//! Tests for recipients that call back into the ledger while being paid.

#![cfg(test)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use vault_core::{
    Account, Amount, Ledger, LedgerConfig, LedgerError, TransferError, ValueTransfer,
};

type ReentrantLedger = Ledger<Arc<ReentrantRecipient>>;
type Callback = Box<dyn FnOnce(&ReentrantLedger) -> Result<(), LedgerError> + Send>;

/// A recipient that runs one callback against the ledger from inside its
/// first payout.
#[derive(Default)]
struct ReentrantRecipient {
    ledger: OnceLock<Weak<ReentrantLedger>>,
    callback: Mutex<Option<Callback>>,
    inner_result: Mutex<Option<Result<(), LedgerError>>>,
    paid: Mutex<Vec<(Account, Amount)>>,
    refuse: AtomicBool,
}

impl ReentrantRecipient {
    fn arm<F>(&self, callback: F)
    where
        F: FnOnce(&ReentrantLedger) -> Result<(), LedgerError> + Send + 'static,
    {
        *self.callback.lock() = Some(Box::new(callback));
    }

    fn inner_result(&self) -> Option<Result<(), LedgerError>> {
        self.inner_result.lock().clone()
    }
}

impl ValueTransfer for ReentrantRecipient {
    fn transfer(&self, recipient: &Account, amount: Amount) -> Result<(), TransferError> {
        let callback = self.callback.lock().take();
        if let Some(callback) = callback {
            let ledger = self
                .ledger
                .get()
                .and_then(Weak::upgrade)
                .ok_or_else(|| TransferError::Unavailable("ledger dropped".to_string()))?;
            let result = callback(&ledger);
            *self.inner_result.lock() = Some(result);
        }

        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransferError::Rejected("recipient refused".to_string()));
        }

        self.paid.lock().push((*recipient, amount));
        Ok(())
    }
}

fn setup(
    global_cap: Amount,
    withdraw_cap: Amount,
) -> (Arc<ReentrantLedger>, Arc<ReentrantRecipient>) {
    let recipient = Arc::new(ReentrantRecipient::default());
    let ledger = Arc::new(
        Ledger::with_transfer(
            LedgerConfig::new(global_cap, withdraw_cap).unwrap(),
            recipient.clone(),
        )
        .unwrap(),
    );
    recipient.ledger.set(Arc::downgrade(&ledger)).unwrap();
    (ledger, recipient)
}

/// A recipient that withdraws again while being paid sees its debited
/// balance and cannot drain the ledger twice.
#[test]
fn test_reentrant_withdraw_sees_debited_balance() {
    let (ledger, recipient) = setup(1_000, 100);
    let alice = Account::from_label("alice");

    ledger.deposit(&alice, 50).unwrap();
    recipient.arm(move |ledger| ledger.withdraw(&alice, 50));

    ledger.withdraw(&alice, 50).unwrap();

    assert_eq!(
        recipient.inner_result(),
        Some(Err(LedgerError::InsufficientBalance {
            requested: 50,
            available: 0
        }))
    );
    assert_eq!(*recipient.paid.lock(), vec![(alice, 50)]);
    assert_eq!(ledger.balance_of(&alice), 0);
    assert_eq!(ledger.total_deposited(), 0);
    assert_eq!(ledger.withdraw_count(), 1);
}

/// A nested withdrawal within the remaining balance is a separate, valid
/// withdrawal.
#[test]
fn test_nested_withdraw_within_balance_succeeds() {
    let (ledger, recipient) = setup(1_000, 100);
    let alice = Account::from_label("alice");

    ledger.deposit(&alice, 100).unwrap();
    recipient.arm(move |ledger| ledger.withdraw(&alice, 40));

    ledger.withdraw(&alice, 40).unwrap();

    assert_eq!(recipient.inner_result(), Some(Ok(())));
    assert_eq!(*recipient.paid.lock(), vec![(alice, 40), (alice, 40)]);
    assert_eq!(ledger.balance_of(&alice), 20);
    assert_eq!(ledger.total_deposited(), 20);
    assert_eq!(ledger.withdraw_count(), 2);
}

/// A deposit made while a payout is in flight cannot claim the capacity the
/// payout still holds.
#[test]
fn test_reentrant_deposit_respects_in_flight_capacity() {
    let (ledger, recipient) = setup(100, 100);
    let alice = Account::from_label("alice");
    let bob = Account::from_label("bob");

    ledger.deposit(&alice, 100).unwrap();
    recipient.arm(move |ledger| {
        assert_eq!(ledger.remaining_capacity(), 0);
        ledger.deposit(&bob, 10)
    });

    ledger.withdraw(&alice, 30).unwrap();

    assert_eq!(
        recipient.inner_result(),
        Some(Err(LedgerError::CapacityExceeded {
            requested: 10,
            remaining: 0
        }))
    );
    assert_eq!(ledger.balance_of(&bob), 0);
    assert_eq!(ledger.remaining_capacity(), 30);
}

/// When the outer payout fails after a nested one settled, only the outer
/// debit is reversed.
#[test]
fn test_failed_outer_payout_keeps_nested_withdrawal() {
    let (ledger, recipient) = setup(1_000, 100);
    let alice = Account::from_label("alice");

    ledger.deposit(&alice, 100).unwrap();
    let refusing = recipient.clone();
    recipient.arm(move |ledger| {
        let result = ledger.withdraw(&alice, 40);
        refusing.refuse.store(true, Ordering::SeqCst);
        result
    });

    let result = ledger.withdraw(&alice, 40);
    assert!(matches!(
        result,
        Err(LedgerError::TransferFailed { amount: 40, .. })
    ));

    assert_eq!(recipient.inner_result(), Some(Ok(())));
    assert_eq!(*recipient.paid.lock(), vec![(alice, 40)]);
    assert_eq!(ledger.balance_of(&alice), 60);
    assert_eq!(ledger.total_deposited(), 60);
    assert_eq!(ledger.withdraw_count(), 1);
    assert_eq!(ledger.remaining_capacity(), 940);
}

/// Reads made from inside a payout observe the debit already applied.
#[test]
fn test_reentrant_reads_observe_debit() {
    let (ledger, recipient) = setup(1_000, 100);
    let alice = Account::from_label("alice");

    ledger.deposit(&alice, 70).unwrap();
    recipient.arm(move |ledger| {
        assert_eq!(ledger.balance_of(&alice), 20);
        assert_eq!(ledger.total_deposited(), 20);
        assert_eq!(ledger.withdraw_count(), 0);
        Ok(())
    });

    ledger.withdraw(&alice, 50).unwrap();
    assert_eq!(recipient.inner_result(), Some(Ok(())));
    assert_eq!(ledger.withdraw_count(), 1);
}
