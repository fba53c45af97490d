//! Withdraw command for the CLI client.

use crate::client::NodeClient;
use crate::errors::CliError;
use tracing::{info, warn};
use vault_core::{Account, Amount};

/// Runs the withdraw command and returns the account's new balance.
pub async fn run(
    client: &NodeClient,
    account: &Account,
    amount: Amount,
) -> Result<Amount, CliError> {
    info!("Withdrawing {} for {}", amount, account);
    match client.withdraw(account, amount).await {
        Ok(balance) => {
            info!("Withdrawal settled, balance is now {}", balance);
            Ok(balance)
        }
        Err(e) => {
            warn!("Withdrawal failed: {}", e);
            Err(e)
        }
    }
}
