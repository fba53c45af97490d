//! Core types for the custodial ledger.

use crate::errors::ParseAccountError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Value held by the ledger, represented as a 128-bit unsigned integer.
pub type Amount = u128;

/// Monotonic operation counter.
pub type Counter = u64;

/// An opaque 32-byte caller identity used as the balance key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Account([u8; 32]);

impl Account {
    /// Wraps raw identity bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derives an account from a human-readable label (SHA-256 of the label).
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        let result = hasher.finalize();

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&result);
        Self(bytes)
    }
}

impl From<[u8; 32]> for Account {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Account({})", self)
    }
}

impl FromStr for Account {
    type Err = ParseAccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s.trim_start_matches("0x"))
            .map_err(|e| ParseAccountError::InvalidHex(e.to_string()))?;

        if raw.len() != 32 {
            return Err(ParseAccountError::InvalidLength(raw.len()));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

// Accounts travel as hex strings in JSON
impl Serialize for Account {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Notification emitted after a successful ledger mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Value was credited to an account.
    Deposited {
        /// The depositing account
        account: Account,
        /// The amount credited
        amount: Amount,
    },

    /// Value was debited from an account and paid out to it.
    Withdrawn {
        /// The withdrawing account
        account: Account,
        /// The amount paid out
        amount: Amount,
    },
}

impl LedgerEvent {
    /// The account the event concerns.
    pub fn account(&self) -> &Account {
        match self {
            LedgerEvent::Deposited { account, .. } | LedgerEvent::Withdrawn { account, .. } => {
                account
            }
        }
    }

    /// The amount moved.
    pub fn amount(&self) -> Amount {
        match self {
            LedgerEvent::Deposited { amount, .. } | LedgerEvent::Withdrawn { amount, .. } => {
                *amount
            }
        }
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Deposited { account, amount } => {
                write!(f, "Deposited {{ account: {}, amount: {} }}", account, amount)
            }
            LedgerEvent::Withdrawn { account, amount } => {
                write!(f, "Withdrawn {{ account: {}, amount: {} }}", account, amount)
            }
        }
    }
}

/// A consistent view of the ledger's aggregate state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerStats {
    /// Maximum total value the ledger may hold
    pub global_cap: Amount,
    /// Maximum value a single withdrawal may move
    pub withdraw_cap: Amount,
    /// Sum of all balances
    pub total_deposited: Amount,
    /// Capacity left under the global cap
    pub remaining_capacity: Amount,
    /// Number of successful deposits
    pub deposit_count: Counter,
    /// Number of successful withdrawals
    pub withdraw_count: Counter,
    /// Number of accounts that have ever deposited
    pub accounts: usize,
}

impl fmt::Display for LedgerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ledger {{ total: {}/{}, remaining: {}, withdraw_cap: {}, deposits: {}, withdrawals: {}, accounts: {} }}",
            self.total_deposited,
            self.global_cap,
            self.remaining_capacity,
            self.withdraw_cap,
            self.deposit_count,
            self.withdraw_count,
            self.accounts
        )
    }
}
