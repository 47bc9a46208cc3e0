//! # Session API
//!
//! An operator session owns the ledger rows recorded by its interactions
//! until they are mirrored. Closing a session drops unmirrored rows and
//! cancels any confirmation wait in flight.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ccon_core::TransactionReceipt;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::interaction::session;
use crate::state::{AppState, SessionHandle};

/// A session as seen by its operator.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Rows recorded but not yet part of the persisted ledger.
    #[schema(value_type = Vec<Object>)]
    pub pending: Vec<TransactionReceipt>,
    /// Rows this session has mirrored in total.
    pub mirrored_rows: usize,
    /// Pointer written by this session's last successful mirror.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pointer: Option<String>,
}

/// Build the sessions router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/{id}", get(get_session).delete(close_session))
        .route("/v1/sessions/{id}/cancel", post(cancel_session))
}

/// POST /v1/sessions: Open a session with an empty ledger.
#[utoipa::path(
    post,
    path = "/v1/sessions",
    responses(
        (status = 201, description = "Session opened", body = SessionSummary),
    ),
    tag = "sessions"
)]
pub(crate) async fn create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSummary>) {
    let handle = state.sessions.create();
    tracing::info!(session = %handle.id, "session opened");
    (
        StatusCode::CREATED,
        Json(SessionSummary {
            id: handle.id,
            created_at: handle.created_at,
            pending: Vec::new(),
            mirrored_rows: 0,
            last_pointer: None,
        }),
    )
}

/// GET /v1/sessions/{id}: Inspect a session's pending rows.
#[utoipa::path(
    get,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session found", body = SessionSummary),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
        (status = 409, description = "An interaction is in flight", body = crate::error::ErrorBody),
    ),
    tag = "sessions"
)]
pub(crate) async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let handle = session(&state, &id)?;
    summarize(&handle).map(Json)
}

fn summarize(handle: &SessionHandle) -> Result<SessionSummary, AppError> {
    let ledger = handle.ledger.try_lock().map_err(|_| {
        AppError::Conflict(format!("session {} has an interaction in flight", handle.id))
    })?;
    Ok(SessionSummary {
        id: handle.id,
        created_at: handle.created_at,
        pending: ledger.receipts().to_vec(),
        mirrored_rows: ledger.mirrored_rows(),
        last_pointer: ledger.last_pointer().map(ToString::to_string),
    })
}

/// DELETE /v1/sessions/{id}: Close a session.
#[utoipa::path(
    delete,
    path = "/v1/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session closed"),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
    ),
    tag = "sessions"
)]
pub(crate) async fn close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))?;
    tracing::info!(session = %id, "session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/sessions/{id}/cancel: Cancel the session's confirmation waits.
///
/// An interaction waiting for a receipt ends with 409. The transaction
/// itself is left to the chain. The session stays open.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/cancel",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 202, description = "Cancellation requested"),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
    ),
    tag = "sessions"
)]
pub(crate) async fn cancel_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let handle = session(&state, &id)?;
    handle.cancel();
    tracing::info!(session = %id, "session waits cancelled");
    Ok(StatusCode::ACCEPTED)
}
