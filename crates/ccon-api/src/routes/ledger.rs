//! # Contract Ledger API
//!
//! The persisted ledger: the snapshot the contract's pointer references,
//! fetched from the content store. Rows recorded by sessions but not yet
//! mirrored are not included. When the content store cannot serve the
//! snapshot the response still succeeds, with no rows and status
//! `unavailable`.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use ccon_core::{TransactionReceipt, LEDGER_COLUMNS};
use ccon_ledger::MirrorError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// Whether the snapshot behind the pointer could be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Ok,
    /// The content store could not serve the snapshot; `rows` is empty.
    Unavailable,
}

/// The persisted ledger.
#[derive(Debug, Serialize, ToSchema)]
pub struct LedgerResponse {
    pub status: LedgerStatus,
    /// Content address the contract points at. Absent before the first
    /// mirror.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    /// Column names in display order.
    pub columns: Vec<String>,
    /// Rows, oldest first.
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<TransactionReceipt>,
}

/// Build the ledger router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/ledger", get(get_ledger))
}

/// GET /v1/ledger: The ledger the contract points at.
#[utoipa::path(
    get,
    path = "/v1/ledger",
    responses(
        (status = 200, description = "Persisted ledger, or a placeholder when the content store is down", body = LedgerResponse),
        (status = 502, description = "Snapshot unreadable", body = crate::error::ErrorBody),
        (status = 503, description = "Relay unreachable", body = crate::error::ErrorBody),
    ),
    tag = "ledger"
)]
pub(crate) async fn get_ledger(
    State(state): State<AppState>,
) -> Result<Json<LedgerResponse>, AppError> {
    let pointer = state.mirror.pointer().await?;
    let (status, rows) = match state.mirror.snapshot_at(pointer.as_ref()).await {
        Ok(table) => (LedgerStatus::Ok, table.into_rows()),
        Err(err @ MirrorError::ContentStore { .. }) => {
            tracing::warn!(error = %err, pointer = ?pointer, "persisted ledger unavailable");
            (LedgerStatus::Unavailable, Vec::new())
        }
        Err(err) => return Err(err.into()),
    };
    Ok(Json(LedgerResponse {
        status,
        pointer: pointer.map(|p| p.to_string()),
        columns: LEDGER_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }))
}
