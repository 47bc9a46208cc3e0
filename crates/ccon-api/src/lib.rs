//! # ccon-api: Axum API Service for Community Connect
//!
//! The presentation layer of the console. Each mutating route performs one
//! contract call in an operator session, records the mined transaction as a
//! ledger row and mirrors the session's rows to the persisted ledger. Read
//! routes report current contract state, balances and the persisted ledger.
//!
//! ## API Surface
//!
//! | Prefix                              | Module                    | Domain              |
//! |-------------------------------------|---------------------------|---------------------|
//! | `/v1/sessions`, `/v1/sessions/{id}` | [`routes::sessions`]      | Operator sessions   |
//! | `/v1/sessions/{id}/donations`       | [`routes::donations`]     | Deposits            |
//! | `/v1/sessions/{id}/goods-requests`, `/v1/goods-requests/*` | [`routes::goods`] | Goods requests |
//! | `/v1/sessions/{id}/fill-offers/*`, `/v1/fill-offers/*` | [`routes::goods`] | Supplier offers |
//! | `/v1/sessions/{id}/invoices/*`, `/v1/invoices/*` | [`routes::invoices`] | Invoice payment |
//! | `/v1/sessions/{id}/cash-requests/*`, `/v1/cash-requests/*` | [`routes::cash`] | Cash assistance |
//! | `/v1/accounts`, `/v1/balances/*`    | [`routes::accounts`]      | Accounts & balances |
//! | `/v1/ledger`                        | [`routes::ledger`]        | Persisted ledger    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Auto-generated OpenAPI 3.1 spec via utoipa derive macros at `/openapi.json`.

pub mod config;
pub mod error;
pub mod extractors;
pub mod interaction;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::ApiMetrics;

pub use error::AppError;
pub use state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` are mounted outside the metrics middleware
/// so scrapes and probes do not count as API traffic.
pub fn app(state: AppState) -> Router {
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::sessions::router())
        .merge(routes::donations::router())
        .merge(routes::goods::router())
        .merge(routes::invoices::router())
        .merge(routes::cash::router())
        .merge(routes::accounts::router())
        .merge(routes::ledger::router())
        .merge(openapi::router())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(metrics))
        .with_state(state.clone());

    let ops = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .route("/metrics", axum::routing::get(render_metrics))
        .with_state(state);

    Router::new().merge(ops).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the contract relay answers.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.gateway.latest_block().await {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(err) => {
            tracing::warn!(error = %err, "readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "contract relay unavailable")
        }
    }
}

/// Prometheus text exposition of every recorded metric.
async fn render_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
