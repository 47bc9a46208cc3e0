//! # Store Subcommand
//!
//! Raw content-store access: publish a file, fetch content by address.
//! Fetched content is verified against its address by the store.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use ccon_core::ContentAddress;
use ccon_store::ContentStore;

/// Arguments for the `ccon store` subcommand.
#[derive(Args, Debug)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub command: StoreCommand,
}

/// Store subcommands.
#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// Publish a file and print its content address.
    Put {
        /// File to publish.
        file: PathBuf,
    },

    /// Fetch content by address.
    Get {
        /// Content address printed by `put` or held by the contract.
        address: String,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

/// Execute a store subcommand.
pub async fn run_store(args: &StoreArgs, store: &dyn ContentStore) -> Result<u8> {
    match &args.command {
        StoreCommand::Put { file } => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let address = store.publish(&bytes).await?;
            tracing::info!(%address, bytes = bytes.len(), backend = store.backend(), "published");
            println!("{address}");
            Ok(0)
        }
        StoreCommand::Get { address, out } => {
            let address = ContentAddress::new(address.as_str()).context("invalid content address")?;
            let bytes = store.fetch(&address).await?;
            match out {
                Some(path) => {
                    std::fs::write(path, &bytes)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("  wrote: {} ({} bytes)", path.display(), bytes.len());
                }
                None => std::io::stdout().write_all(&bytes)?,
            }
            Ok(0)
        }
    }
}
