//! Integration tests for the capped custodial vault.

pub mod ledger_tests;
pub mod node_tests;
pub mod reentrancy_tests;
