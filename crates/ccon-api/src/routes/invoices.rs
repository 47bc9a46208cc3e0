//! # Invoice API
//!
//! Once the non-profit approves an offer, the contract holds it as the
//! approved invoice. Paying it confirms the goods were received and moves
//! the compensation from the contract to the supplier.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use ccon_core::{Address, Wei};
use ccon_gateway::{ApprovedInvoice, CallOptions};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::interaction::{self, InteractionResponse};
use crate::state::AppState;

/// The invoice approved for payment.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovedInvoiceView {
    #[schema(value_type = String)]
    pub supplier: Address,
    #[schema(value_type = String)]
    pub amount: Wei,
    pub invoice_number: u64,
}

impl From<ApprovedInvoice> for ApprovedInvoiceView {
    fn from(i: ApprovedInvoice) -> Self {
        Self {
            supplier: i.supplier,
            amount: i.amount,
            invoice_number: i.invoice_number,
        }
    }
}

/// Payment form. An empty object pays the current approved invoice.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayInvoiceForm {
    /// Invoice to pay. Defaults to the approved invoice's number.
    #[serde(default)]
    pub invoice_number: Option<u64>,
    /// Whether the goods were received.
    #[serde(default = "received_default")]
    pub received: bool,
}

fn received_default() -> bool {
    true
}

/// Build the invoices router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/invoices/approved", get(approved_invoice))
        .route("/v1/sessions/{id}/invoices/pay", post(pay_invoice))
}

/// GET /v1/invoices/approved: The invoice approved for payment.
#[utoipa::path(
    get,
    path = "/v1/invoices/approved",
    responses(
        (status = 200, description = "Approved invoice", body = ApprovedInvoiceView),
        (status = 404, description = "No invoice approved", body = crate::error::ErrorBody),
    ),
    tag = "invoices"
)]
pub(crate) async fn approved_invoice(
    State(state): State<AppState>,
) -> Result<Json<ApprovedInvoiceView>, AppError> {
    state
        .gateway
        .view_approved_invoice()
        .await?
        .map(|i| Json(i.into()))
        .ok_or_else(|| AppError::NotFound("no invoice approved".to_string()))
}

/// POST /v1/sessions/{id}/invoices/pay: Pay the approved invoice.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/invoices/pay",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = PayInvoiceForm,
    responses(
        (status = 200, description = "Invoice paid", body = InteractionResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
        (status = 409, description = "No invoice approved", body = crate::error::ErrorBody),
        (status = 502, description = "Contract rejected the payment", body = crate::error::ErrorBody),
    ),
    tag = "invoices"
)]
pub(crate) async fn pay_invoice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<PayInvoiceForm>, JsonRejection>,
) -> Result<Json<InteractionResponse>, AppError> {
    let handle = interaction::session(&state, &id)?;
    let form = extract_json(body)?;

    let invoice_number = match form.invoice_number {
        Some(number) => number,
        None => state
            .gateway
            .view_approved_invoice()
            .await?
            .map(|i| i.invoice_number)
            .ok_or_else(|| AppError::Conflict("no invoice approved for payment".to_string()))?,
    };

    let opts = CallOptions::sender(state.roles.nonprofit.clone());
    let response = interaction::run(
        &state,
        &handle,
        "payInvoice",
        state
            .gateway
            .pay_invoice(invoice_number, form.received, &opts),
    )
    .await?;
    tracing::info!(invoice_number, "invoice paid");
    Ok(Json(response))
}
