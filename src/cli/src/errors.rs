//! Error types for the CLI client.

use thiserror::Error;
use vault_core::ParseAccountError;

/// Errors that can occur in the CLI client.
#[derive(Error, Debug)]
pub enum CliError {
    /// Error when a file operation fails.
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),

    /// Error when JSON serialization or deserialization fails.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error when the node cannot be reached.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Error when the node rejects a request.
    #[error("Node rejected the request ({kind}): {message}")]
    Rejected {
        /// JSON-RPC error code
        code: i32,
        /// Ledger error kind, or "rpc" for protocol errors
        kind: String,
        /// Human-readable message from the node
        message: String,
    },

    /// Error when the node answers with something unexpected.
    #[error("Invalid response from node: {0}")]
    InvalidResponse(String),

    /// Error when an account is invalid.
    #[error("Invalid account: {0}")]
    InvalidAccount(#[from] ParseAccountError),

    /// Error when no acting account was given.
    #[error("No account given: pass --account or --label, or set a label in the config")]
    MissingAccount,
}
