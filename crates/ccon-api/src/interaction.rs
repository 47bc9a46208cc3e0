//! # Interaction Pipeline
//!
//! Every mutating route runs the same sequence against one session:
//!
//! ```text
//! lock session ─► submit call ─► wait for receipt ─► append row ─► mirror ledger ─► respond
//! ```
//!
//! Submission and confirmation failures end the interaction with an error.
//! Mirror and map failures do not: the call already happened on-chain, so
//! the response carries the row anyway, with the failure reported in
//! `mirror` and the map omitted.

use std::future::Future;
use std::sync::Arc;

use ccon_core::TransactionReceipt;
use ccon_gateway::{CancellationToken, GatewayError, PendingTx};
use ccon_ledger::{LedgerSession, MirrorError, MirrorOutcome};
use ccon_oracle::MapPin;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, SessionHandle};

/// Outcome of mirroring the session after an interaction.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MirrorReport {
    /// The merged snapshot is published and the contract points at it.
    Ok {
        pointer: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_pointer: Option<String>,
        /// `false` when the snapshot was unchanged and no write was needed.
        pointer_written: bool,
    },
    /// The mirror did not complete. The session keeps its rows for the next
    /// attempt.
    Failed { stage: String, error: String },
}

impl MirrorReport {
    fn ok(outcome: &MirrorOutcome) -> Self {
        Self::Ok {
            pointer: outcome.pointer.to_string(),
            previous_pointer: outcome.previous_pointer.as_ref().map(ToString::to_string),
            pointer_written: outcome.pointer_receipt.is_some(),
        }
    }

    fn failed(err: &MirrorError) -> Self {
        Self::Failed {
            stage: err.stage().to_string(),
            error: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

/// Response to a mutating interaction.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InteractionResponse {
    pub session_id: Uuid,
    /// Contract function that was called.
    pub function: String,
    /// The ledger row recorded for this call.
    #[schema(value_type = Object)]
    pub row: TransactionReceipt,
    /// The merged ledger when the mirror succeeded, otherwise the rows the
    /// session still holds.
    #[schema(value_type = Vec<Object>)]
    pub ledger: Vec<TransactionReceipt>,
    pub mirror: MirrorReport,
    /// Map pin of the request location, when one could be looked up.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub map: Option<MapPin>,
}

/// Look up a session or fail with 404.
pub fn session(state: &AppState, id: &Uuid) -> Result<Arc<SessionHandle>, AppError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| AppError::NotFound(format!("session {id}")))
}

/// Run `submit` in `handle`'s session: confirm, record, mirror.
pub async fn run<F>(
    state: &AppState,
    handle: &SessionHandle,
    function: &str,
    submit: F,
) -> Result<InteractionResponse, AppError>
where
    F: Future<Output = Result<PendingTx, GatewayError>> + Send,
{
    let mut ledger = handle.ledger.lock().await;
    let cancel = handle.token();

    let row = state
        .transactor
        .transact(&mut ledger, &cancel, submit)
        .await
        .map_err(|err| {
            metrics::counter!("ccon_api_interactions_failed_total", "function" => function.to_string())
                .increment(1);
            tracing::warn!(session = %handle.id, function, error = %err, "interaction failed");
            err
        })?;
    metrics::counter!("ccon_api_interactions_total", "function" => function.to_string())
        .increment(1);

    let (mirror, rows) = mirror_session(state, &mut ledger, &cancel).await;
    Ok(InteractionResponse {
        session_id: handle.id,
        function: function.to_string(),
        row,
        ledger: rows,
        mirror,
        map: None,
    })
}

/// Mirror the session as the non-profit. Never fails the interaction.
async fn mirror_session(
    state: &AppState,
    ledger: &mut LedgerSession,
    cancel: &CancellationToken,
) -> (MirrorReport, Vec<TransactionReceipt>) {
    match ledger
        .mirror(&state.mirror, &state.roles.nonprofit, cancel)
        .await
    {
        Ok(outcome) => (MirrorReport::ok(&outcome), outcome.snapshot.into_rows()),
        Err(err) => (MirrorReport::failed(&err), ledger.receipts().to_vec()),
    }
}

/// Pin for `location`, or `None` when maps are off or the lookup fails.
pub async fn map_pin(state: &AppState, location: &str) -> Option<MapPin> {
    let geocoder = state.geocoder.as_ref()?;
    match geocoder.pin(location).await {
        Ok(pin) => Some(pin),
        Err(err) => {
            tracing::warn!(error = %err, location, "map pin unavailable");
            None
        }
    }
}
