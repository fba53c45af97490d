//! Tests for the node and the CLI client talking to it.

#![cfg(test)]

use serial_test::serial;
use std::net::SocketAddr;
use tempfile::tempdir;
use vault_cli::{
    commands::{balance, deposit, stats, withdraw},
    CliError, NodeClient,
};
use vault_core::{Account, LedgerConfig};
use vault_node::{build_ledger, config::NodeConfig, rpc::rpc_routes};

fn node_config(global_cap: u128, withdraw_cap: u128) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.ledger = LedgerConfig {
        global_cap,
        withdraw_cap,
    };
    config
}

/// Serves a node built from `config` on an ephemeral port.
fn spawn_node(config: &NodeConfig) -> SocketAddr {
    let ledger = build_ledger(config).unwrap();
    let (addr, server) = warp::serve(rpc_routes(ledger)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

/// Tests the CLI commands against a live node.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_client_round_trip() {
    let addr = spawn_node(&node_config(1_000, 200));
    let client = NodeClient::new(&format!("http://{}", addr));
    let alice = Account::from_label("alice");

    assert_eq!(balance::run(&client, &alice).await.unwrap(), 0);
    assert_eq!(deposit::run(&client, &alice, 500).await.unwrap(), 500);
    assert_eq!(withdraw::run(&client, &alice, 150).await.unwrap(), 350);
    assert_eq!(balance::run(&client, &alice).await.unwrap(), 350);

    let rows = stats::run(&client).await.unwrap();
    let lookup = |name: &str| {
        rows.iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value.clone())
            .unwrap()
    };
    assert_eq!(lookup("total_deposited"), "350");
    assert_eq!(lookup("remaining_capacity"), "650");
    assert_eq!(lookup("deposit_count"), "1");
    assert_eq!(lookup("withdraw_count"), "1");
}

/// Tests that ledger rejections reach the client with their kind.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_client_sees_rejections() {
    let addr = spawn_node(&node_config(100, 50));
    let client = NodeClient::new(&format!("http://{}/rpc", addr));
    let alice = Account::from_label("alice");

    deposit::run(&client, &alice, 80).await.unwrap();

    match withdraw::run(&client, &alice, 60).await {
        Err(CliError::Rejected { code, kind, .. }) => {
            assert_eq!(code, -32004);
            assert_eq!(kind, "withdraw_limit_exceeded");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    match deposit::run(&client, &alice, 30).await {
        Err(CliError::Rejected { kind, .. }) => assert_eq!(kind, "capacity_exceeded"),
        other => panic!("unexpected result: {:?}", other),
    }

    match client.call("mint", serde_json::json!([])).await {
        Err(CliError::Rejected { code, kind, .. }) => {
            assert_eq!(code, -32601);
            assert_eq!(kind, "rpc");
        }
        other => panic!("unexpected result: {:?}", other),
    }

    assert_eq!(balance::run(&client, &alice).await.unwrap(), 80);
}

/// Tests that an unreachable node is reported as a network error.
#[tokio::test]
async fn test_unreachable_node() {
    let client = NodeClient::new("http://127.0.0.1:9");
    let result = balance::run(&client, &Account::from_label("alice")).await;
    assert!(matches!(result, Err(CliError::NetworkError(_))));
}

/// Tests that a node configuration written to disk builds the same ledger.
#[test]
fn test_node_config_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("node.json");

    let mut config = node_config(5_000, 250);
    config.payout.timeout_ms = 1_500;
    config.to_file(&path).unwrap();

    let loaded = NodeConfig::from_file(&path).unwrap();
    assert_eq!(loaded.ledger, config.ledger);
    assert_eq!(loaded.payout.timeout_ms, 1_500);

    let ledger = build_ledger(&loaded).unwrap();
    assert_eq!(ledger.global_cap(), 5_000);
    assert_eq!(ledger.withdraw_cap(), 250);
}

/// Tests that a node refuses to start with a zero cap.
#[test]
fn test_invalid_node_config() {
    assert!(build_ledger(&node_config(0, 10)).is_err());
    assert!(build_ledger(&node_config(10, 0)).is_err());
}
