//! # Cash Assistance API
//!
//! A beneficiary requests an amount (`requestCash`); the non-profit approves
//! it by sending the requested amount from the contract (`sendCash`).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use ccon_core::{Address, Wei};
use ccon_gateway::{CallOptions, CashRequest};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::interaction::{self, InteractionResponse};
use crate::state::AppState;

/// Cash request form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CashRequestForm {
    /// Beneficiary asking for cash; the request is sent from this account.
    #[schema(value_type = String)]
    pub requester: Address,
    /// Amount needed, in wei.
    #[schema(value_type = String)]
    pub amount: Wei,
}

impl Validate for CashRequestForm {
    fn validate(&self) -> Result<(), String> {
        if self.amount == Wei::ZERO {
            return Err("amount must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// The open cash request.
#[derive(Debug, Serialize, ToSchema)]
pub struct CashRequestView {
    #[schema(value_type = String)]
    pub requester: Address,
    #[schema(value_type = String)]
    pub amount: Wei,
}

impl From<CashRequest> for CashRequestView {
    fn from(c: CashRequest) -> Self {
        Self {
            requester: c.requester,
            amount: c.amount,
        }
    }
}

/// Build the cash router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{id}/cash-requests", post(request_cash))
        .route("/v1/cash-requests/current", get(current_cash_request))
        .route("/v1/sessions/{id}/cash-requests/approve", post(approve_cash))
}

/// POST /v1/sessions/{id}/cash-requests: Request cash assistance.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/cash-requests",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = CashRequestForm,
    responses(
        (status = 200, description = "Cash request recorded", body = InteractionResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid form", body = crate::error::ErrorBody),
        (status = 502, description = "Contract rejected the request", body = crate::error::ErrorBody),
    ),
    tag = "cash"
)]
pub(crate) async fn request_cash(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<CashRequestForm>, JsonRejection>,
) -> Result<Json<InteractionResponse>, AppError> {
    let handle = interaction::session(&state, &id)?;
    let form = extract_validated_json(body)?;
    if !state.roles.is_beneficiary(&form.requester) {
        return Err(AppError::Validation(format!(
            "{} is not a beneficiary account",
            form.requester
        )));
    }

    let opts = CallOptions::sender(form.requester);
    let response = interaction::run(
        &state,
        &handle,
        "requestCash",
        state.gateway.request_cash(form.amount, &opts),
    )
    .await?;
    Ok(Json(response))
}

/// GET /v1/cash-requests/current: The open cash request.
#[utoipa::path(
    get,
    path = "/v1/cash-requests/current",
    responses(
        (status = 200, description = "Open cash request", body = CashRequestView),
        (status = 404, description = "No cash request open", body = crate::error::ErrorBody),
    ),
    tag = "cash"
)]
pub(crate) async fn current_cash_request(
    State(state): State<AppState>,
) -> Result<Json<CashRequestView>, AppError> {
    state
        .gateway
        .view_cash_request()
        .await?
        .map(|c| Json(c.into()))
        .ok_or_else(|| AppError::NotFound("no cash request open".to_string()))
}

/// POST /v1/sessions/{id}/cash-requests/approve: Send the requested cash.
///
/// Reads the open request and sends exactly its amount to its requester,
/// with the non-profit as sender and approver.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/cash-requests/approve",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Cash sent", body = InteractionResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
        (status = 409, description = "No cash request open", body = crate::error::ErrorBody),
        (status = 502, description = "Contract rejected the transfer", body = crate::error::ErrorBody),
    ),
    tag = "cash"
)]
pub(crate) async fn approve_cash(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InteractionResponse>, AppError> {
    let handle = interaction::session(&state, &id)?;
    let request = state
        .gateway
        .view_cash_request()
        .await?
        .ok_or_else(|| AppError::Conflict("no cash request open".to_string()))?;

    let nonprofit = state.roles.nonprofit.clone();
    let opts = CallOptions::sender(nonprofit.clone());
    let response = interaction::run(
        &state,
        &handle,
        "sendCash",
        state
            .gateway
            .send_cash(request.amount, &request.requester, &nonprofit, &opts),
    )
    .await?;
    Ok(Json(response))
}
