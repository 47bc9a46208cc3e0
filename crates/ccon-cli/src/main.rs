//! # ccon CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ccon_cli::balance::{run_balance, BalanceArgs};
use ccon_cli::ledger::{run_ledger, LedgerArgs};
use ccon_cli::store::{run_store, StoreArgs};
use ccon_cli::{gateway_from_env, store_from_env};
use ccon_oracle::{OracleConfig, PriceFeed, SpotPriceFeed};

/// Community Connect operator CLI.
///
/// Inspects the persisted transaction ledger, quotes account balances and
/// talks to the content store directly. Configuration comes from the same
/// environment variables as `ccon-api`.
#[derive(Parser, Debug)]
#[command(name = "ccon", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the persisted ledger or its pointer.
    Ledger(LedgerArgs),

    /// Quote an account balance.
    Balance(BalanceArgs),

    /// Publish or fetch raw content.
    Store(StoreArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match dispatch(cli.command).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn dispatch(command: Commands) -> anyhow::Result<u8> {
    match command {
        Commands::Ledger(args) => run_ledger(&args, gateway_from_env()?, store_from_env()?).await,
        Commands::Balance(args) => {
            let gateway = gateway_from_env()?;
            let oracle = OracleConfig::from_env()?;
            let feed = if args.no_usd {
                None
            } else {
                Some(SpotPriceFeed::from_config(&oracle)?)
            };
            run_balance(
                &args,
                gateway.as_ref(),
                feed.as_ref().map(|f| f as &dyn PriceFeed),
                &oracle.price_pair,
            )
            .await
        }
        Commands::Store(args) => {
            let store = store_from_env()?;
            run_store(&args, store.as_ref()).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccon_cli::ledger::LedgerCommand;
    use ccon_cli::store::StoreCommand;
    use std::path::PathBuf;

    #[test]
    fn cli_parse_ledger_show() {
        let cli = Cli::try_parse_from(["ccon", "ledger", "show"]).unwrap();
        if let Commands::Ledger(args) = cli.command {
            assert!(matches!(args.command, LedgerCommand::Show { json: false }));
        } else {
            panic!("expected ledger");
        }
    }

    #[test]
    fn cli_parse_ledger_show_json() {
        let cli = Cli::try_parse_from(["ccon", "ledger", "show", "--json"]).unwrap();
        if let Commands::Ledger(args) = cli.command {
            assert!(matches!(args.command, LedgerCommand::Show { json: true }));
        }
    }

    #[test]
    fn cli_parse_ledger_pointer() {
        let cli = Cli::try_parse_from(["ccon", "ledger", "pointer"]).unwrap();
        if let Commands::Ledger(args) = cli.command {
            assert!(matches!(args.command, LedgerCommand::Pointer));
        }
    }

    #[test]
    fn cli_parse_balance() {
        let address = "0xa000000000000000000000000000000000000001";
        let cli = Cli::try_parse_from(["ccon", "balance", address, "--no-usd"]).unwrap();
        if let Commands::Balance(args) = cli.command {
            assert_eq!(args.address, address);
            assert!(args.no_usd);
        } else {
            panic!("expected balance");
        }
    }

    #[test]
    fn cli_parse_store_put() {
        let cli = Cli::try_parse_from(["ccon", "store", "put", "ledger.json"]).unwrap();
        if let Commands::Store(args) = cli.command {
            match args.command {
                StoreCommand::Put { file } => assert_eq!(file, PathBuf::from("ledger.json")),
                other => panic!("expected put, got {other:?}"),
            }
        }
    }

    #[test]
    fn cli_parse_store_get_with_out() {
        let cli =
            Cli::try_parse_from(["ccon", "store", "get", "abc123", "--out", "x.json"]).unwrap();
        if let Commands::Store(args) = cli.command {
            match args.command {
                StoreCommand::Get { address, out } => {
                    assert_eq!(address, "abc123");
                    assert_eq!(out, Some(PathBuf::from("x.json")));
                }
                other => panic!("expected get, got {other:?}"),
            }
        }
    }

    #[test]
    fn cli_verbose_counts() {
        let cli = Cli::try_parse_from(["ccon", "-vv", "ledger", "pointer"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn cli_requires_a_subcommand() {
        assert!(Cli::try_parse_from(["ccon"]).is_err());
    }
}
