//! # ccon-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the Community Connect console.
//! Binds to `PORT` (default 8080). `--simulate` swaps the contract relay
//! for an in-process simulated contract.

use std::sync::Arc;

use anyhow::Context;
use ccon_api::config::AppConfig;
use ccon_api::state::{AccountRoles, AppState, SessionRegistry};
use ccon_gateway::{ContractGateway, HttpContractGateway, SimulatedContract};
use ccon_oracle::{MapboxGeocoder, SpotPriceFeed};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

/// Community Connect API server.
#[derive(Parser, Debug)]
#[command(name = "ccon-api", version, about)]
struct Args {
    /// Run against an in-process simulated contract instead of a relay.
    #[arg(long, env = "CCON_SIMULATE")]
    simulate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let recorder = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;

    let gateway: Arc<dyn ContractGateway> = if args.simulate {
        tracing::warn!("running against a simulated contract; nothing reaches a chain");
        Arc::new(SimulatedContract::new())
    } else {
        tracing::info!(relay = %config.gateway.relay_url, "contract relay configured");
        Arc::new(HttpContractGateway::new(&config.gateway)?)
    };
    let store = config.store.build()?;
    let roles = AccountRoles::resolve(&config.roles, gateway.as_ref())
        .await
        .context("failed to resolve account roles")?;

    let mut state = AppState::new(gateway, store, roles, config.gateway.confirmation)
        .with_mirror_policy(config.mirror_policy)
        .with_metrics(recorder);

    match MapboxGeocoder::from_config(&config.oracle)? {
        Some(geocoder) => state = state.with_geocoder(Arc::new(geocoder)),
        None => tracing::info!("MAPBOX_ACCESS_TOKEN not set; map pins disabled"),
    }
    let feed = SpotPriceFeed::from_config(&config.oracle)?;
    state = state.with_price_feed(Arc::new(feed), config.oracle.price_pair.clone());

    let sessions = state.sessions.clone();
    let app = ccon_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, policy = ?config.mirror_policy, "Community Connect API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sessions))
        .await?;

    Ok(())
}

/// Structured logging. JSON lines when `CCON_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("CCON_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Resolves on Ctrl-C. Cancels every session's confirmation waits so
/// in-flight interactions finish promptly.
async fn shutdown_signal(sessions: SessionRegistry) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
    tracing::info!(open_sessions = sessions.len(), "shutting down");
    sessions.cancel_all();
}
