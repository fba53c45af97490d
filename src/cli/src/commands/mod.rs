//! Commands for the CLI client.

pub mod account;
pub mod balance;
pub mod deposit;
pub mod stats;
pub mod withdraw;
