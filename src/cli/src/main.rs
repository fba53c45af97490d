//! CLI client for the capped custodial vault.

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vault_cli::commands::{account, balance, deposit, stats, withdraw};
use vault_cli::{ClientConfig, NodeClient};
use vault_core::Account;

/// Command line arguments for the CLI client.
#[derive(Debug, StructOpt)]
#[structopt(name = "vault-cli", about = "Capped custodial vault client")]
struct Opt {
    /// Path to the configuration file
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Node to connect to
    #[structopt(short, long)]
    node: Option<String>,

    /// Account to act as, in 0x-prefixed hex
    #[structopt(short, long)]
    account: Option<String>,

    /// Derive the account to act as from this label
    #[structopt(short, long)]
    label: Option<String>,

    /// Subcommand to run
    #[structopt(subcommand)]
    cmd: Command,
}

/// Subcommands for the CLI client.
#[derive(Debug, StructOpt)]
enum Command {
    /// Get the balance of an account
    #[structopt(name = "balance")]
    Balance {
        /// Account to query instead of the acting one
        #[structopt(long)]
        of: Option<String>,
    },

    /// Deposit value into the vault
    #[structopt(name = "deposit")]
    Deposit {
        /// Amount to deposit
        #[structopt(long)]
        amount: u128,
    },

    /// Withdraw value from the vault
    #[structopt(name = "withdraw")]
    Withdraw {
        /// Amount to withdraw
        #[structopt(long)]
        amount: u128,
    },

    /// Show vault statistics
    #[structopt(name = "stats")]
    Stats,

    /// Print the acting account
    #[structopt(name = "account")]
    Account,

    /// Save the node and label to the configuration file
    #[structopt(name = "init")]
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command line arguments
    let opt = Opt::from_args();

    // Load configuration, falling back to defaults when the file is absent
    let config_path = opt.config.clone().unwrap_or_else(ClientConfig::default_path);
    let mut config = if config_path.exists() {
        ClientConfig::from_file(&config_path)?
    } else {
        ClientConfig::default()
    };

    // Override node if specified
    if let Some(node) = &opt.node {
        config.node = node.clone();
    }

    let client = NodeClient::new(&config.node);
    let acting = || account::resolve(opt.account.as_deref(), opt.label.as_deref(), &config);

    // Run the appropriate command
    match &opt.cmd {
        Command::Balance { of } => {
            let target = match of {
                Some(of) => of.parse::<Account>()?,
                None => acting()?,
            };
            let amount = balance::run(&client, &target).await?;
            println!("{} {}", "Account:".green(), target);
            println!("{} {}", "Balance:".green(), amount);
        }
        Command::Deposit { amount } => {
            let target = acting()?;
            let balance = deposit::run(&client, &target, *amount).await?;
            println!("{} {}", "Deposited:".green(), amount);
            println!("{} {}", "Balance:".green(), balance);
        }
        Command::Withdraw { amount } => {
            let target = acting()?;
            match withdraw::run(&client, &target, *amount).await {
                Ok(balance) => {
                    println!("{} {}", "Withdrawn:".green(), amount);
                    println!("{} {}", "Balance:".green(), balance);
                }
                Err(e) => {
                    println!("{} {}", "Withdrawal rejected:".red(), e);
                    return Err(e.into());
                }
            }
        }
        Command::Stats => {
            for (field, value) in stats::run(&client).await? {
                println!("{} {}", format!("{}:", field).green(), value);
            }
        }
        Command::Account => {
            println!("{} {}", "Account:".green(), acting()?);
        }
        Command::Init => {
            let mut saved = config.clone();
            if let Some(label) = &opt.label {
                saved.label = Some(label.clone());
            }
            saved.to_file(&config_path)?;
            println!("{} {}", "Configuration saved:".green(), config_path.display());
        }
    }

    Ok(())
}
