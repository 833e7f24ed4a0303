//! WorkLock CLI - Bid for staking tokens in the WorkLock auction
//!
//! # Quick Start
//!
//! ```bash
//! # Simulate a whole round on an in-process tester chain
//! worklock simulate --bidders 5
//!
//! # Against a node with managed accounts
//! worklock bid --value 12.5 --provider http://localhost:8545 --registry-filepath registry.json
//! worklock status --staking-address 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed --provider ...
//! ```

use clap::{Parser, Subcommand};
use worklock_types::{parse_checksum_address, Address};

mod commands;
mod config;
mod connect;
mod display;
mod error;
mod logging;
mod options;

use commands::{policy, simulate, worklock};
use config::WorklockConfig;
use connect::Connection;
use options::{ConfigOptions, NodeOptions, PolicyOptions, ProviderOptions, TransactingOptions};

/// WorkLock CLI - bid ETH, claim locked stake
#[derive(Parser)]
#[command(name = "worklock")]
#[command(author = "WorkLock Contributors")]
#[command(version)]
#[command(about = "Bid, cancel and claim in the WorkLock auction", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    config: ConfigOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place or increase a bid
    Bid {
        /// Bid amount in ETH
        #[arg(long)]
        value: String,

        #[command(flatten)]
        transacting: TransactingOptions,

        #[command(flatten)]
        provider: ProviderOptions,
    },

    /// Cancel a bid and refund the deposit
    CancelBid {
        #[command(flatten)]
        transacting: TransactingOptions,

        #[command(flatten)]
        provider: ProviderOptions,
    },

    /// Claim tokens once bidding has closed
    Claim {
        #[command(flatten)]
        transacting: TransactingOptions,

        #[command(flatten)]
        provider: ProviderOptions,
    },

    /// Show the auction state and a staker's position
    Status {
        /// Address of a staker
        #[arg(long, value_parser = parse_checksum_address)]
        staking_address: Option<Address>,

        #[command(flatten)]
        provider: ProviderOptions,
    },

    /// Run a complete round on a development tester chain
    Simulate {
        /// Number of bidders
        #[arg(short, long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=50))]
        bidders: u32,

        /// Bid of the first bidder in ETH; bidder i bids (i + 1) times this
        #[arg(long, default_value = "10")]
        bid: u64,

        /// Index of a bidder who cancels before bidding closes
        #[arg(long)]
        cancel: Option<usize>,
    },

    /// Print the merged configuration
    Config {
        #[command(flatten)]
        provider: ProviderOptions,

        #[command(flatten)]
        node: NodeOptions,
    },

    /// Validate a set of policy options
    PolicyCheck {
        #[command(flatten)]
        policy: PolicyOptions,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = WorklockConfig::load(cli.config.config_file.as_deref(), cli.config.config_root.as_deref())?;
    logging::init_logging(&config.logging)?;

    match cli.command {
        Commands::Bid {
            value,
            transacting,
            provider,
        } => {
            config.apply_provider(&provider);
            let connection = Connection::open(&config, &provider)?;
            worklock::bid(&connection, &config, &transacting, &value).await?;
        }
        Commands::CancelBid { transacting, provider } => {
            config.apply_provider(&provider);
            let connection = Connection::open(&config, &provider)?;
            worklock::cancel_bid(&connection, &config, &transacting).await?;
        }
        Commands::Claim { transacting, provider } => {
            config.apply_provider(&provider);
            let connection = Connection::open(&config, &provider)?;
            worklock::claim(&connection, &config, &transacting).await?;
        }
        Commands::Status {
            staking_address,
            provider,
        } => {
            config.apply_provider(&provider);
            let connection = Connection::open(&config, &provider)?;
            worklock::status(&connection, staking_address).await?;
        }
        Commands::Simulate { bidders, bid, cancel } => {
            simulate::run_simulation(bidders, bid, cancel).await?;
        }
        Commands::Config { provider, node } => {
            config.apply_provider(&provider);
            config.apply_node(&node);
            commands::config::show_config(&config)?;
        }
        Commands::PolicyCheck { policy } => {
            policy::check_policy(&policy)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("worklock").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bid_collects_option_groups() {
        let cli = parse(&[
            "bid",
            "--value",
            "1.5",
            "--checksum-address",
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "-x",
            "--force",
            "--etherscan",
            "--no-etherscan",
            "-d",
            "--network",
            "ibex",
        ])
        .unwrap();

        match cli.command {
            Commands::Bid {
                value,
                transacting,
                provider,
            } => {
                assert_eq!(value, "1.5");
                assert!(transacting.dry_run);
                assert!(transacting.force);
                assert!(!transacting.etherscan());
                assert!(!transacting.hw_wallet());
                assert_eq!(
                    transacting.checksum_address.map(|a| worklock_types::checksum(&a)).as_deref(),
                    Some("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed")
                );
                assert!(provider.dev);
                assert_eq!(provider.network.as_deref(), Some("ibex"));
            }
            _ => panic!("expected bid"),
        }
    }

    #[test]
    fn test_invalid_checksum_address_rejected() {
        let result = parse(&[
            "claim",
            "--checksum-address",
            "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_node_options_and_ports() {
        let cli = parse(&[
            "config",
            "--controller-port",
            "8151",
            "--discovery-port",
            "9151",
            "--db-filepath",
            "/tmp/worklock.db",
            "-F",
            "--teacher",
            "https://seed.example:9151",
            "--min-stake",
            "15000",
            "-G",
            "--poa",
            "--light",
        ])
        .unwrap();

        match cli.command {
            Commands::Config { provider, node } => {
                assert_eq!(node.controller_port, Some(8151));
                assert!(node.federated_only);
                assert_eq!(node.teacher_uri.as_deref(), Some("https://seed.example:9151"));
                assert_eq!(node.min_stake, Some(15000));
                assert!(provider.geth && provider.poa && provider.light);
            }
            _ => panic!("expected config"),
        }

        assert!(parse(&["config", "--controller-port", "0"]).is_err());
        assert!(parse(&["config", "--discovery-port", "70000"]).is_err());
    }

    #[test]
    fn test_policy_options_parse() {
        let cli = parse(&[
            "policy-check",
            "--label",
            "docs",
            "--m",
            "2",
            "--n",
            "3",
            "--policy-encrypting-key",
            "02ab",
            "--message-kit",
            "AAEC",
        ])
        .unwrap();
        match cli.command {
            Commands::PolicyCheck { policy } => {
                let params = policy.validate().unwrap();
                assert_eq!((params.m, params.n), (2, 3));
            }
            _ => panic!("expected policy-check"),
        }
        assert!(parse(&["policy-check", "--m", "two"]).is_err());
    }

    #[test]
    fn test_missing_config_file_rejected() {
        let result = parse(&["--config-file", "/nonexistent/worklock.toml", "simulate"]);
        assert!(result.is_err());
    }
}
