//! Stats command for the CLI client.

use crate::client::NodeClient;
use crate::errors::CliError;

/// Fields shown by the stats command, in display order.
pub const FIELDS: [&str; 7] = [
    "global_cap",
    "withdraw_cap",
    "total_deposited",
    "remaining_capacity",
    "deposit_count",
    "withdraw_count",
    "accounts",
];

/// Runs the stats command and returns `(field, value)` rows.
pub async fn run(client: &NodeClient) -> Result<Vec<(&'static str, String)>, CliError> {
    let stats = client.stats().await?;
    rows(&stats)
}

fn rows(stats: &serde_json::Value) -> Result<Vec<(&'static str, String)>, CliError> {
    FIELDS
        .iter()
        .map(|field| match &stats[*field] {
            serde_json::Value::String(value) => Ok((*field, value.clone())),
            serde_json::Value::Number(value) => Ok((*field, value.to_string())),
            other => Err(CliError::InvalidResponse(format!(
                "Missing stats field {}: {}",
                field, other
            ))),
        })
        .collect()
}
