//! Node daemon for the capped custodial vault.

use anyhow::Result;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vault_node::{build_ledger, config::NodeConfig, metrics, rpc};

/// Command line arguments for the node daemon.
#[derive(Debug, StructOpt)]
#[structopt(name = "vault-node", about = "Capped custodial vault node")]
struct Opt {
    /// Path to the configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Maximum total value the vault may hold
    #[structopt(long)]
    global_cap: Option<u128>,

    /// Maximum value a single withdrawal may move
    #[structopt(long)]
    withdraw_cap: Option<u128>,

    /// JSON-RPC server address
    #[structopt(long)]
    rpc_addr: Option<String>,

    /// Enable metrics server
    #[structopt(long)]
    metrics: bool,

    /// Metrics server address
    #[structopt(long)]
    metrics_addr: Option<String>,

    /// Webhook that settles withdrawals
    #[structopt(long)]
    payout_endpoint: Option<String>,

    /// Payout timeout in milliseconds
    #[structopt(long)]
    payout_timeout_ms: Option<u64>,

    /// Write the effective configuration to this file and exit
    #[structopt(long, parse(from_os_str))]
    dump_config: Option<PathBuf>,
}

impl Opt {
    /// Applies command line overrides on top of the file configuration.
    fn apply(&self, config: &mut NodeConfig) {
        if let Some(global_cap) = self.global_cap {
            config.ledger.global_cap = global_cap;
        }
        if let Some(withdraw_cap) = self.withdraw_cap {
            config.ledger.withdraw_cap = withdraw_cap;
        }
        if let Some(addr) = &self.rpc_addr {
            config.rpc.listen_addr = addr.clone();
        }
        if self.metrics {
            config.metrics.enabled = true;
        }
        if let Some(addr) = &self.metrics_addr {
            config.metrics.listen_addr = addr.clone();
        }
        if let Some(endpoint) = &self.payout_endpoint {
            config.payout.endpoint = Some(endpoint.clone());
        }
        if let Some(timeout_ms) = self.payout_timeout_ms {
            config.payout.timeout_ms = timeout_ms;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command line arguments
    let opt = Opt::from_args();

    // Load configuration
    let mut config = match &opt.config {
        Some(path) => NodeConfig::from_file(path)?,
        None => NodeConfig::default(),
    };
    opt.apply(&mut config);
    config.validate()?;

    if let Some(path) = &opt.dump_config {
        config.to_file(path)?;
        info!("Configuration written to {}", path.display());
        return Ok(());
    }

    let ledger = build_ledger(&config)?;

    if config.metrics.enabled {
        metrics::register_metrics();
        metrics::start_metrics_server(&config.metrics.listen_addr).await?;
    }

    rpc::start_rpc_server(&config.rpc.listen_addr, ledger.clone()).await?;

    tokio::signal::ctrl_c().await?;

    let stats = ledger.stats();
    info!("Shutting down: {}", stats);

    Ok(())
}
