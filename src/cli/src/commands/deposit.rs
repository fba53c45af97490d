//! Deposit command for the CLI client.

use crate::client::NodeClient;
use crate::errors::CliError;
use tracing::info;
use vault_core::{Account, Amount};

/// Runs the deposit command and returns the account's new balance.
pub async fn run(
    client: &NodeClient,
    account: &Account,
    amount: Amount,
) -> Result<Amount, CliError> {
    info!("Depositing {} for {}", amount, account);
    let balance = client.deposit(account, amount).await?;
    info!("Deposit accepted, balance is now {}", balance);
    Ok(balance)
}
