//! JSON-RPC client for the vault node.

use crate::errors::CliError;
use serde::Deserialize;
use tracing::debug;
use vault_core::{Account, Amount};

/// Error object of a JSON-RPC response.
#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i32,
    message: String,
    data: Option<serde_json::Value>,
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct RpcReply {
    result: Option<serde_json::Value>,
    error: Option<RpcErrorBody>,
}

/// Talks to a node over JSON-RPC.
#[derive(Debug, Clone)]
pub struct NodeClient {
    rpc_url: String,
    http: reqwest::Client,
}

impl NodeClient {
    /// Creates a client for the node at `node_url`; `/rpc` is appended if missing.
    pub fn new(node_url: &str) -> Self {
        let rpc_url = if node_url.ends_with("/rpc") {
            node_url.to_string()
        } else {
            format!("{}/rpc", node_url.trim_end_matches('/'))
        };

        Self {
            rpc_url,
            http: reqwest::Client::new(),
        }
    }

    /// Returns the full RPC URL.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Calls `method` and returns its result.
    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, CliError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        debug!("RPC request to {}: {}", self.rpc_url, request);

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| CliError::NetworkError(e.to_string()))?;

        let response_text = response
            .text()
            .await
            .map_err(|e| CliError::NetworkError(format!("Failed to get response text: {}", e)))?;
        debug!("RPC response: {}", response_text);

        if response_text.is_empty() {
            return Err(CliError::InvalidResponse("Empty response from node".to_string()));
        }

        let reply: RpcReply = serde_json::from_str(&response_text)?;

        if let Some(error) = reply.error {
            let kind = error
                .data
                .as_ref()
                .and_then(|data| data.get("kind"))
                .and_then(|kind| kind.as_str())
                .unwrap_or("rpc")
                .to_string();
            return Err(CliError::Rejected {
                code: error.code,
                kind,
                message: error.message,
            });
        }

        Ok(reply.result.unwrap_or(serde_json::Value::Null))
    }

    /// Returns the balance of `account`.
    pub async fn balance_of(&self, account: &Account) -> Result<Amount, CliError> {
        let result = self
            .call("balanceOf", serde_json::json!([account.to_string()]))
            .await?;
        parse_amount(&result)
    }

    /// Deposits `amount` for `account` and returns the new balance.
    pub async fn deposit(&self, account: &Account, amount: Amount) -> Result<Amount, CliError> {
        let result = self
            .call(
                "deposit",
                serde_json::json!([account.to_string(), amount.to_string()]),
            )
            .await?;
        parse_amount(&result["balance"])
    }

    /// Withdraws `amount` for `account` and returns the new balance.
    pub async fn withdraw(&self, account: &Account, amount: Amount) -> Result<Amount, CliError> {
        let result = self
            .call(
                "withdraw",
                serde_json::json!([account.to_string(), amount.to_string()]),
            )
            .await?;
        parse_amount(&result["balance"])
    }

    /// Returns the node's ledger statistics.
    pub async fn stats(&self) -> Result<serde_json::Value, CliError> {
        self.call("getStats", serde_json::json!([])).await
    }
}

/// Amounts come back as decimal strings; plain numbers are accepted too.
fn parse_amount(value: &serde_json::Value) -> Result<Amount, CliError> {
    if let Some(amount) = value.as_u64() {
        return Ok(amount as Amount);
    }

    value
        .as_str()
        .and_then(|text| text.parse::<Amount>().ok())
        .ok_or_else(|| CliError::InvalidResponse(format!("Invalid amount format: {}", value)))
}
