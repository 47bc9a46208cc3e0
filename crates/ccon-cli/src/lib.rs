//! # ccon-cli: Operator CLI for Community Connect
//!
//! Provides the `ccon` command-line interface for inspecting what the
//! console has persisted, without going through the HTTP API.
//!
//! ## Subcommands
//!
//! - `ccon ledger show`: The ledger the contract points at.
//! - `ccon ledger pointer`: The contract's ledger pointer.
//! - `ccon balance <address>`: Balance in wei, ether and USD.
//! - `ccon store put|get`: Raw content-store operations.
//!
//! Every command reads the same environment variables as `ccon-api`.

pub mod balance;
pub mod ledger;
pub mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use ccon_gateway::{ContractGateway, GatewayConfig, HttpContractGateway};
use ccon_store::{ContentStore, StoreConfig};

/// Contract gateway for the relay named by `CCON_GATEWAY_URL`.
pub fn gateway_from_env() -> Result<Arc<dyn ContractGateway>> {
    let config = GatewayConfig::from_env().context("invalid gateway configuration")?;
    tracing::debug!(?config, "gateway configuration loaded");
    Ok(Arc::new(HttpContractGateway::new(&config)?))
}

/// Content store selected by `CCON_STORE`.
pub fn store_from_env() -> Result<Arc<dyn ContentStore>> {
    let config = StoreConfig::from_env().context("invalid content store configuration")?;
    let store = config.build()?;
    if store.backend() == "memory" {
        tracing::warn!("CCON_STORE is memory; nothing persists past this command");
    }
    Ok(store)
}
