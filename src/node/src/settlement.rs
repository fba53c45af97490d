//! Payout primitives used by the node to settle withdrawals.

use crate::config::PayoutConfig;
use crate::errors::NodeError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, info};
use vault_core::{Account, Amount, TransferError, ValueTransfer};

/// Body posted to the payout webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayoutRequest {
    /// The account being paid
    pub recipient: Account,
    /// The amount, as a decimal string
    pub amount: String,
}

/// Posts payouts to an HTTP endpoint.
///
/// A 2xx answer settles the payout; anything else, a timeout or a
/// connection error fails it. Must be invoked off the async worker threads
/// (for example inside `spawn_blocking`), since it blocks on the request.
pub struct WebhookPayout {
    /// HTTP client carrying the request timeout
    client: reqwest::Client,
    /// Where payouts are posted
    endpoint: String,
    /// Upper bound on a single payout
    timeout: Duration,
}

impl WebhookPayout {
    /// Creates a payout client for `endpoint`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, NodeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::PayoutError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Returns the webhook URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, recipient: &Account, amount: Amount) -> Result<(), TransferError> {
        let request = PayoutRequest {
            recipient: *recipient,
            amount: amount.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if status.is_success() {
            debug!(%recipient, amount = %amount, "Payout accepted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TransferError::Rejected(format!("{} {}", status, body).trim().to_string()))
        }
    }

    fn classify(&self, error: reqwest::Error) -> TransferError {
        if error.is_timeout() {
            TransferError::TimedOut(self.timeout)
        } else {
            TransferError::Unavailable(error.to_string())
        }
    }
}

impl ValueTransfer for WebhookPayout {
    fn transfer(&self, recipient: &Account, amount: Amount) -> Result<(), TransferError> {
        let handle = Handle::try_current()
            .map_err(|e| TransferError::Unavailable(format!("No async runtime: {}", e)))?;
        handle.block_on(self.post(recipient, amount))
    }
}

/// How the node settles withdrawals.
pub enum Settlement {
    /// Log the payout and report success.
    DryRun,
    /// Post the payout to a webhook.
    Webhook(WebhookPayout),
}

impl Settlement {
    /// Builds the settlement configured in `config`.
    pub fn from_config(config: &PayoutConfig) -> Result<Self, NodeError> {
        match &config.endpoint {
            Some(endpoint) => {
                let webhook = WebhookPayout::new(endpoint.clone(), config.timeout())?;
                info!("Settling payouts through {}", webhook.endpoint());
                Ok(Settlement::Webhook(webhook))
            }
            None => {
                info!("No payout endpoint configured, payouts are only logged");
                Ok(Settlement::DryRun)
            }
        }
    }
}

impl ValueTransfer for Settlement {
    fn transfer(&self, recipient: &Account, amount: Amount) -> Result<(), TransferError> {
        match self {
            Settlement::DryRun => {
                info!(%recipient, amount = %amount, "Dry-run payout");
                Ok(())
            }
            Settlement::Webhook(webhook) => webhook.transfer(recipient, amount),
        }
    }
}
