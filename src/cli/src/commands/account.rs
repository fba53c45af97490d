//! Resolves the account a command acts on.

use crate::config::ClientConfig;
use crate::errors::CliError;
use vault_core::Account;

/// Picks the acting account.
///
/// An explicit hex account wins over a label, and a label given on the
/// command line wins over the one stored in the configuration.
pub fn resolve(
    account: Option<&str>,
    label: Option<&str>,
    config: &ClientConfig,
) -> Result<Account, CliError> {
    if let Some(account) = account {
        return Ok(account.parse()?);
    }

    label
        .or(config.label.as_deref())
        .map(Account::from_label)
        .ok_or(CliError::MissingAccount)
}
