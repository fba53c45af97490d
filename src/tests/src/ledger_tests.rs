//! Tests for the ledger in the core crate.

#![cfg(test)]

use parking_lot::Mutex;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use vault_core::{
    Account, Amount, Ledger, LedgerConfig, LedgerError, TransferError, ValueTransfer,
};

/// Pays out every transfer and remembers it.
#[derive(Default)]
struct RecordingTransfer {
    paid: Mutex<Vec<(Account, Amount)>>,
}

impl ValueTransfer for RecordingTransfer {
    fn transfer(&self, recipient: &Account, amount: Amount) -> Result<(), TransferError> {
        self.paid.lock().push((*recipient, amount));
        Ok(())
    }
}

/// Refuses a random share of transfers.
struct FlakyTransfer {
    rng: Mutex<StdRng>,
}

impl ValueTransfer for FlakyTransfer {
    fn transfer(&self, _recipient: &Account, _amount: Amount) -> Result<(), TransferError> {
        if self.rng.lock().gen_bool(0.25) {
            Err(TransferError::Rejected("flaky recipient".to_string()))
        } else {
            Ok(())
        }
    }
}

fn random_account(rng: &mut impl Rng) -> Account {
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    Account::new(bytes)
}

fn ledger(global_cap: Amount, withdraw_cap: Amount) -> Ledger<RecordingTransfer> {
    Ledger::with_transfer(
        LedgerConfig::new(global_cap, withdraw_cap).unwrap(),
        RecordingTransfer::default(),
    )
    .unwrap()
}

/// Walks through deposits and withdrawals across two accounts.
#[test]
fn test_deposit_and_withdraw_flow() {
    let ledger = ledger(1_000, 300);
    let alice = Account::from_label("alice");
    let bob = Account::from_label("bob");

    ledger.deposit(&alice, 500).unwrap();
    ledger.deposit(&bob, 200).unwrap();
    assert_eq!(ledger.total_deposited(), 700);
    assert_eq!(ledger.remaining_capacity(), 300);

    ledger.withdraw(&alice, 300).unwrap();
    ledger.withdraw(&bob, 200).unwrap();

    assert_eq!(ledger.balance_of(&alice), 200);
    assert_eq!(ledger.balance_of(&bob), 0);
    assert_eq!(ledger.total_deposited(), 200);
    assert_eq!(ledger.deposit_count(), 2);
    assert_eq!(ledger.withdraw_count(), 2);
    assert_eq!(
        *ledger.transfer().paid.lock(),
        vec![(alice, 300), (bob, 200)]
    );

    let stats = ledger.stats();
    assert_eq!(stats.accounts, 2);
    assert_eq!(stats.remaining_capacity, 800);
}

/// A withdrawal frees capacity for later deposits.
#[test]
fn test_capacity_is_released_by_withdrawals() {
    let ledger = ledger(100, 100);
    let alice = Account::from_label("alice");

    ledger.deposit(&alice, 100).unwrap();
    assert_eq!(
        ledger.deposit(&alice, 1),
        Err(LedgerError::CapacityExceeded {
            requested: 1,
            remaining: 0
        })
    );

    ledger.withdraw(&alice, 40).unwrap();
    ledger.deposit(&alice, 40).unwrap();
    assert_eq!(ledger.balance_of(&alice), 100);
    assert_eq!(ledger.deposit_count(), 2);
}

/// Rejected operations change nothing.
#[test]
fn test_rejections_leave_state_untouched() {
    let ledger = ledger(100, 50);
    let alice = Account::from_label("alice");
    let bob = Account::from_label("bob");

    ledger.deposit(&alice, 80).unwrap();

    assert_eq!(ledger.deposit(&alice, 0), Err(LedgerError::ZeroAmount));
    assert_eq!(ledger.withdraw(&alice, 0), Err(LedgerError::ZeroAmount));
    assert_eq!(
        ledger.withdraw(&bob, 1),
        Err(LedgerError::InsufficientBalance {
            requested: 1,
            available: 0
        })
    );
    assert_eq!(
        ledger.withdraw(&alice, 51),
        Err(LedgerError::WithdrawLimitExceeded {
            requested: 51,
            limit: 50
        })
    );
    assert_eq!(ledger.receive(&bob, 10), Err(LedgerError::ZeroAmount));

    assert_eq!(ledger.balance_of(&alice), 80);
    assert_eq!(ledger.total_deposited(), 80);
    assert_eq!(ledger.deposit_count(), 1);
    assert_eq!(ledger.withdraw_count(), 0);
    assert!(ledger.transfer().paid.lock().is_empty());
}

/// Rejections carry the requested amount and the limit that stopped it.
#[test]
fn test_rejections_report_exact_amounts() {
    let ledger = ledger(100, 50);
    let alice = Account::from_label("alice");
    let bob = Account::from_label("bob");

    ledger.deposit(&alice, 80).unwrap();
    assert_eq!(
        ledger.withdraw(&alice, 80),
        Err(LedgerError::WithdrawLimitExceeded {
            requested: 80,
            limit: 50
        })
    );

    ledger.deposit(&bob, 10).unwrap();
    assert_eq!(
        ledger.withdraw(&bob, 15),
        Err(LedgerError::InsufficientBalance {
            requested: 15,
            available: 10
        })
    );

    let carol = Account::from_label("carol");
    assert_eq!(
        ledger.deposit(&carol, 20),
        Err(LedgerError::CapacityExceeded {
            requested: 20,
            remaining: 10
        })
    );

    assert_eq!(ledger.balance_of(&alice), 80);
    assert_eq!(ledger.balance_of(&bob), 10);
    assert_eq!(ledger.total_deposited(), 90);
}

/// Two ledgers never share state.
#[test]
fn test_ledgers_are_independent() {
    let first = ledger(100, 50);
    let second = ledger(100, 50);
    let alice = Account::from_label("alice");

    first.deposit(&alice, 60).unwrap();

    assert_eq!(second.balance_of(&alice), 0);
    assert_eq!(second.remaining_capacity(), 100);
}

/// Random operations with random payout failures keep the books balanced.
#[test]
fn test_random_operations_keep_books_balanced() {
    let mut rng = StdRng::seed_from_u64(7);
    let accounts: Vec<Account> = (0..5).map(|_| random_account(&mut rng)).collect();

    let global_cap = 10_000;
    let withdraw_cap = 700;
    let ledger = Ledger::with_transfer(
        LedgerConfig::new(global_cap, withdraw_cap).unwrap(),
        FlakyTransfer {
            rng: Mutex::new(StdRng::seed_from_u64(11)),
        },
    )
    .unwrap();

    let mut expected: HashMap<Account, Amount> = HashMap::new();
    let mut deposits: u64 = 0;
    let mut withdrawals: u64 = 0;

    for _ in 0..2_000 {
        let account = accounts[rng.gen_range(0..accounts.len())];
        let amount = rng.gen_range(0..1_000u128);

        if rng.gen_bool(0.5) {
            if ledger.deposit(&account, amount).is_ok() {
                *expected.entry(account).or_default() += amount;
                deposits += 1;
            }
        } else {
            match ledger.withdraw(&account, amount) {
                Ok(()) => {
                    *expected.entry(account).or_default() -= amount;
                    withdrawals += 1;
                }
                Err(LedgerError::TransferFailed { amount: failed, .. }) => {
                    assert_eq!(failed, amount);
                }
                Err(_) => {}
            }
        }

        let total: Amount = accounts.iter().map(|a| ledger.balance_of(a)).sum();
        assert_eq!(total, ledger.total_deposited());
        assert!(ledger.total_deposited() <= global_cap);
    }

    for account in &accounts {
        assert_eq!(
            ledger.balance_of(account),
            expected.get(account).copied().unwrap_or(0)
        );
    }
    assert_eq!(ledger.deposit_count(), deposits);
    assert_eq!(ledger.withdraw_count(), withdrawals);
}

/// Concurrent callers on several threads never breach the cap.
#[test]
fn test_concurrent_callers_respect_the_cap() {
    let ledger = Arc::new(ledger(5_000, 100));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = ledger.clone();
            thread::spawn(move || {
                let account = Account::from_label(&format!("worker-{}", i));
                let mut accepted: Amount = 0;
                for _ in 0..200 {
                    if ledger.deposit(&account, 10).is_ok() {
                        accepted += 10;
                    }
                    if ledger.withdraw(&account, 5).is_ok() {
                        accepted -= 5;
                    }
                }
                (account, accepted)
            })
        })
        .collect();

    let mut total: Amount = 0;
    for handle in handles {
        let (account, accepted) = handle.join().unwrap();
        assert_eq!(ledger.balance_of(&account), accepted);
        total += accepted;
    }

    assert_eq!(ledger.total_deposited(), total);
    assert!(total <= 5_000);
    assert_eq!(
        ledger.transfer().paid.lock().len() as u64,
        ledger.withdraw_count()
    );
}
