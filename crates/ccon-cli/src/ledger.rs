//! # Ledger Subcommand
//!
//! Reads the persisted ledger: the contract's pointer and the snapshot it
//! references in the content store.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use ccon_core::{TransactionReceipt, LEDGER_COLUMNS};
use ccon_gateway::ContractGateway;
use ccon_ledger::LedgerMirror;
use ccon_store::ContentStore;

/// Arguments for the `ccon ledger` subcommand.
#[derive(Args, Debug)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub command: LedgerCommand,
}

/// Ledger subcommands.
#[derive(Subcommand, Debug)]
pub enum LedgerCommand {
    /// Print the ledger the contract points at.
    Show {
        /// Print the rows as JSON records instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the contract's ledger pointer.
    Pointer,
}

/// Execute a ledger subcommand. Exit code 1 when nothing has been
/// published yet.
pub async fn run_ledger(
    args: &LedgerArgs,
    gateway: Arc<dyn ContractGateway>,
    store: Arc<dyn ContentStore>,
) -> Result<u8> {
    match &args.command {
        LedgerCommand::Show { json } => {
            let persisted = LedgerMirror::new(gateway, store)
                .persisted_ledger()
                .await
                .context("failed to load the persisted ledger")?;
            if persisted.pointer.is_none() {
                eprintln!("no ledger published yet");
                return Ok(1);
            }
            if *json {
                println!("{}", serde_json::to_string_pretty(persisted.table.rows())?);
            } else {
                print!("{}", render_table(persisted.table.rows()));
            }
            Ok(0)
        }
        LedgerCommand::Pointer => match gateway.ipfs_hash().await? {
            Some(pointer) => {
                println!("{pointer}");
                Ok(0)
            }
            None => {
                eprintln!("no ledger published yet");
                Ok(1)
            }
        },
    }
}

/// Render rows as a left-aligned text table under [`LEDGER_COLUMNS`].
pub fn render_table(rows: &[TransactionReceipt]) -> String {
    let cells: Vec<[String; 6]> = rows.iter().map(TransactionReceipt::cells).collect();
    let mut widths = LEDGER_COLUMNS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut push_line = |line: Vec<&str>| {
        let padded: Vec<String> = line
            .iter()
            .zip(widths.iter())
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };
    push_line(LEDGER_COLUMNS.to_vec());
    for row in &cells {
        push_line(row.iter().map(String::as_str).collect());
    }
    out
}
