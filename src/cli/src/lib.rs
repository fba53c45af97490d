//! Command-line client for the capped custodial vault.

pub mod client;
pub mod commands;
pub mod config;
pub mod errors;

// Re-export commonly used types
pub use client::NodeClient;
pub use config::ClientConfig;
pub use errors::CliError;
