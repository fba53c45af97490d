//! Balance command for the CLI client.

use crate::client::NodeClient;
use crate::errors::CliError;
use tracing::info;
use vault_core::{Account, Amount};

/// Runs the balance command.
pub async fn run(client: &NodeClient, account: &Account) -> Result<Amount, CliError> {
    info!("Getting balance for account: {}", account);
    client.balance_of(account).await
}
