//! JSON-RPC server for the node daemon.
//!
//! Ledger calls run on the blocking pool: a withdrawal holds the ledger lock
//! for as long as its payout takes, and the payout itself blocks on HTTP.

use crate::metrics::{record_rejection, MetricsSink, RPC_TIME, TOTAL_DEPOSITED};
use crate::settlement::Settlement;
use crate::errors::NodeError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vault_core::{Account, Amount, Ledger, LedgerError};
use warp::{Filter, Rejection, Reply};

/// The ledger type hosted by the node.
pub type NodeLedger = Ledger<Settlement, MetricsSink>;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Method to call
    pub method: String,
    /// Parameters for the method
    #[serde(default)]
    pub params: serde_json::Value,
    /// Request ID
    #[serde(default)]
    pub id: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version
    pub jsonrpc: String,
    /// Result of the method call
    pub result: Option<serde_json::Value>,
    /// Error, if any
    pub error: Option<JsonRpcError>,
    /// Request ID
    pub id: serde_json::Value,
}

/// JSON-RPC error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    pub data: Option<serde_json::Value>,
}

/// State for the RPC server.
struct RpcState {
    /// The ledger being served
    ledger: Arc<NodeLedger>,
}

/// Builds the `POST /rpc` route.
pub fn rpc_routes(
    ledger: Arc<NodeLedger>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let state = Arc::new(RpcState { ledger });

    warp::path("rpc")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(handle_rpc)
}

/// Starts the JSON-RPC server on `listen_addr` and returns the bound address.
pub async fn start_rpc_server(
    listen_addr: &str,
    ledger: Arc<NodeLedger>,
) -> Result<SocketAddr, NodeError> {
    let addr: SocketAddr = listen_addr.parse().map_err(|e| {
        NodeError::RpcError(format!("Invalid listen address {}: {}", listen_addr, e))
    })?;

    let (bound, server) = warp::serve(rpc_routes(ledger))
        .try_bind_ephemeral(addr)
        .map_err(|e| NodeError::RpcError(format!("Failed to bind {}: {}", addr, e)))?;
    tokio::spawn(server);

    info!("JSON-RPC server listening on {}", bound);
    Ok(bound)
}

/// Provides the RPC state to handlers.
fn with_state(
    state: Arc<RpcState>,
) -> impl Filter<Extract = (Arc<RpcState>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Handles a JSON-RPC request.
async fn handle_rpc(
    request: JsonRpcRequest,
    state: Arc<RpcState>,
) -> Result<impl Reply, Rejection> {
    let timer = RPC_TIME.start_timer();
    let id = request.id.clone();

    let result = if request.jsonrpc != "2.0" {
        Err(JsonRpcError {
            code: -32600,
            message: "Invalid request".to_string(),
            data: Some(serde_json::json!("jsonrpc must be \"2.0\"")),
        })
    } else {
        dispatch(&request.method, &request.params, &state).await
    };

    timer.observe_duration();

    let response = match result {
        Ok(result) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result),
            error: None,
            id,
        },
        Err(error) => JsonRpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id,
        },
    };

    Ok(warp::reply::json(&response))
}

async fn dispatch(
    method: &str,
    params: &serde_json::Value,
    state: &RpcState,
) -> Result<serde_json::Value, JsonRpcError> {
    match method {
        "deposit" => handle_deposit(params, state).await,
        "withdraw" => handle_withdraw(params, state).await,
        "receive" => handle_receive(params, state).await,
        "balanceOf" => handle_balance_of(params, state).await,
        "balance_of" => handle_balance_of(params, state).await, // Alias for balanceOf
        "depositCount" => handle_deposit_count(state).await,
        "withdrawCount" => handle_withdraw_count(state).await,
        "remainingCapacity" => handle_remaining_capacity(state).await,
        "getStats" => handle_get_stats(state).await,
        "get_stats" => handle_get_stats(state).await, // Alias for getStats
        _ => Err(JsonRpcError {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(serde_json::json!(method)),
        }),
    }
}

/// Runs `f` against the ledger on the blocking pool.
async fn with_ledger<F, R>(state: &RpcState, f: F) -> Result<R, JsonRpcError>
where
    F: FnOnce(&NodeLedger) -> R + Send + 'static,
    R: Send + 'static,
{
    let ledger = state.ledger.clone();
    tokio::task::spawn_blocking(move || f(&ledger))
        .await
        .map_err(|e| JsonRpcError {
            code: -32603,
            message: "Internal error".to_string(),
            data: Some(serde_json::json!(e.to_string())),
        })
}

/// Handles the deposit method.
async fn handle_deposit(
    params: &serde_json::Value,
    state: &RpcState,
) -> Result<serde_json::Value, JsonRpcError> {
    let params = expect_params(params, 2)?;
    let caller = parse_account(&params[0])?;
    let amount = parse_amount(&params[1])?;

    info!("RPC: Deposit of {} from {}", amount, caller);

    let (balance, total) = with_ledger(state, move |ledger| {
        ledger
            .deposit(&caller, amount)
            .map(|()| (ledger.balance_of(&caller), ledger.total_deposited()))
    })
    .await?
    .map_err(|e| ledger_error("deposit", e))?;

    TOTAL_DEPOSITED.set(total as f64);

    Ok(serde_json::json!({
        "account": caller,
        "balance": balance.to_string(),
    }))
}

/// Handles the withdraw method.
async fn handle_withdraw(
    params: &serde_json::Value,
    state: &RpcState,
) -> Result<serde_json::Value, JsonRpcError> {
    let params = expect_params(params, 2)?;
    let caller = parse_account(&params[0])?;
    let amount = parse_amount(&params[1])?;

    info!("RPC: Withdrawal of {} by {}", amount, caller);

    let (balance, total) = with_ledger(state, move |ledger| {
        ledger
            .withdraw(&caller, amount)
            .map(|()| (ledger.balance_of(&caller), ledger.total_deposited()))
    })
    .await?
    .map_err(|e| ledger_error("withdraw", e))?;

    TOTAL_DEPOSITED.set(total as f64);

    Ok(serde_json::json!({
        "account": caller,
        "balance": balance.to_string(),
    }))
}

/// Handles the receive method: value sent outside of `deposit`.
async fn handle_receive(
    params: &serde_json::Value,
    state: &RpcState,
) -> Result<serde_json::Value, JsonRpcError> {
    let params = expect_params(params, 2)?;
    let sender = parse_account(&params[0])?;
    let amount = parse_amount(&params[1])?;

    with_ledger(state, move |ledger| ledger.receive(&sender, amount))
        .await?
        .map_err(|e| ledger_error("receive", e))?;

    Ok(serde_json::Value::Null)
}

/// Handles the balanceOf method.
async fn handle_balance_of(
    params: &serde_json::Value,
    state: &RpcState,
) -> Result<serde_json::Value, JsonRpcError> {
    let params = expect_params(params, 1)?;
    let account = parse_account(&params[0])?;

    let balance = with_ledger(state, move |ledger| ledger.balance_of(&account)).await?;
    debug!("RPC: Balance of {} is {}", account, balance);

    // Amounts are strings to avoid JSON number precision issues
    Ok(serde_json::json!(balance.to_string()))
}

/// Handles the depositCount method.
async fn handle_deposit_count(state: &RpcState) -> Result<serde_json::Value, JsonRpcError> {
    let count = with_ledger(state, |ledger| ledger.deposit_count()).await?;
    Ok(serde_json::json!(count))
}

/// Handles the withdrawCount method.
async fn handle_withdraw_count(state: &RpcState) -> Result<serde_json::Value, JsonRpcError> {
    let count = with_ledger(state, |ledger| ledger.withdraw_count()).await?;
    Ok(serde_json::json!(count))
}

/// Handles the remainingCapacity method.
async fn handle_remaining_capacity(state: &RpcState) -> Result<serde_json::Value, JsonRpcError> {
    let remaining = with_ledger(state, |ledger| ledger.remaining_capacity()).await?;
    Ok(serde_json::json!(remaining.to_string()))
}

/// Handles the getStats method.
async fn handle_get_stats(state: &RpcState) -> Result<serde_json::Value, JsonRpcError> {
    let stats = with_ledger(state, |ledger| ledger.stats()).await?;

    Ok(serde_json::json!({
        "global_cap": stats.global_cap.to_string(),
        "withdraw_cap": stats.withdraw_cap.to_string(),
        "total_deposited": stats.total_deposited.to_string(),
        "remaining_capacity": stats.remaining_capacity.to_string(),
        "deposit_count": stats.deposit_count,
        "withdraw_count": stats.withdraw_count,
        "accounts": stats.accounts,
    }))
}

fn invalid_params(message: impl Into<String>) -> JsonRpcError {
    JsonRpcError {
        code: -32602,
        message: message.into(),
        data: None,
    }
}

fn expect_params(
    params: &serde_json::Value,
    expected: usize,
) -> Result<&Vec<serde_json::Value>, JsonRpcError> {
    let params = params
        .as_array()
        .ok_or_else(|| invalid_params("Invalid params"))?;

    if params.len() != expected {
        return Err(invalid_params(format!(
            "Invalid params: expected {} values, got {}",
            expected,
            params.len()
        )));
    }

    Ok(params)
}

fn parse_account(value: &serde_json::Value) -> Result<Account, JsonRpcError> {
    let text = value
        .as_str()
        .ok_or_else(|| invalid_params("Invalid account"))?;

    text.parse().map_err(|e: vault_core::ParseAccountError| JsonRpcError {
        code: -32602,
        message: "Invalid account".to_string(),
        data: Some(serde_json::json!(e.to_string())),
    })
}

/// Accepts amounts as JSON integers or decimal strings.
fn parse_amount(value: &serde_json::Value) -> Result<Amount, JsonRpcError> {
    if let Some(amount) = value.as_u64() {
        return Ok(amount as Amount);
    }

    value
        .as_str()
        .and_then(|text| text.parse::<Amount>().ok())
        .ok_or_else(|| invalid_params("Invalid amount"))
}

/// Maps a ledger rejection to a JSON-RPC error and counts it.
fn ledger_error(operation: &str, error: LedgerError) -> JsonRpcError {
    warn!("RPC: {} rejected: {}", operation, error);
    record_rejection(operation, &error);

    let (code, data) = match &error {
        LedgerError::ZeroAmount => (-32001, serde_json::json!({ "kind": error.kind() })),
        LedgerError::CapacityExceeded {
            requested,
            remaining,
        } => (
            -32002,
            serde_json::json!({
                "kind": error.kind(),
                "requested": requested.to_string(),
                "remaining": remaining.to_string(),
            }),
        ),
        LedgerError::InsufficientBalance {
            requested,
            available,
        } => (
            -32003,
            serde_json::json!({
                "kind": error.kind(),
                "requested": requested.to_string(),
                "available": available.to_string(),
            }),
        ),
        LedgerError::WithdrawLimitExceeded { requested, limit } => (
            -32004,
            serde_json::json!({
                "kind": error.kind(),
                "requested": requested.to_string(),
                "limit": limit.to_string(),
            }),
        ),
        LedgerError::TransferFailed {
            recipient,
            amount,
            source,
        } => (
            -32005,
            serde_json::json!({
                "kind": error.kind(),
                "recipient": recipient,
                "amount": amount.to_string(),
                "reason": source.to_string(),
            }),
        ),
        LedgerError::Overflow => (-32006, serde_json::json!({ "kind": error.kind() })),
        LedgerError::InvalidConfig(_) => (-32007, serde_json::json!({ "kind": error.kind() })),
    };

    JsonRpcError {
        code,
        message: error.to_string(),
        data: Some(data),
    }
}
