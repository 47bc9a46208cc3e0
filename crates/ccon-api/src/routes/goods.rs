//! # Goods Request API
//!
//! The goods workflow as the contract runs it:
//!
//! 1. A beneficiary registers a request (`registerRequest`).
//! 2. The supplier offers to fill it (`fillRequest`, keystore-signed).
//! 3. The non-profit approves the offer (`approveFillOffer`).
//! 4. The non-profit pays the approved invoice (see [`super::invoices`]).
//!
//! The contract holds one current request and one current offer. Registering
//! and offering both return a map pin of the request location when a
//! geocoder is configured.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use ccon_core::{Address, Wei};
use ccon_gateway::{CallOptions, FillOffer, GoodsRequest, NewGoodsRequest, ProductType, RequestLocation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::interaction::{self, InteractionResponse};
use crate::state::AppState;

// -- Forms --------------------------------------------------------------------

/// Postal address of a request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationForm {
    pub street: String,
    pub city: String,
    /// State abbreviation, e.g. `AZ`.
    pub state: String,
    pub zip: String,
}

impl From<LocationForm> for RequestLocation {
    fn from(form: LocationForm) -> Self {
        RequestLocation {
            street: form.street.trim().to_string(),
            city: form.city.trim().to_string(),
            state: form.state.trim().to_string(),
            zip: form.zip.trim().to_string(),
        }
    }
}

/// Goods request form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GoodsRequestForm {
    /// Beneficiary submitting the request.
    #[schema(value_type = String)]
    pub owner: Address,
    /// Product name.
    pub name: String,
    /// `Food`, `Supplies` or `Ride`.
    #[schema(value_type = String, example = "Food")]
    pub product_type: ProductType,
    /// Ignored for rides, which always request 1.
    #[serde(default)]
    pub quantity: u64,
    pub location: LocationForm,
}

impl Validate for GoodsRequestForm {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if self.product_type != ProductType::Ride && self.quantity == 0 {
            return Err(format!(
                "quantity must be at least 1 for {}",
                self.product_type
            ));
        }
        let loc = &self.location;
        for (field, value) in [
            ("street", &loc.street),
            ("city", &loc.city),
            ("state", &loc.state),
            ("zip", &loc.zip),
        ] {
            if value.trim().is_empty() {
                return Err(format!("location.{field} must not be empty"));
            }
        }
        Ok(())
    }
}

/// Supplier's offer to fill the current request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FillOfferForm {
    /// Compensation requested, in wei.
    #[schema(value_type = String)]
    pub amount: Wei,
    pub invoice_number: u64,
}

impl Validate for FillOfferForm {
    fn validate(&self) -> Result<(), String> {
        if self.amount == Wei::ZERO {
            return Err("amount must be greater than zero".to_string());
        }
        Ok(())
    }
}

// -- Views --------------------------------------------------------------------

/// The contract's current goods request.
#[derive(Debug, Serialize, ToSchema)]
pub struct GoodsRequestView {
    #[schema(value_type = String)]
    pub owner: Address,
    pub name: String,
    #[schema(value_type = String)]
    pub product_type: ProductType,
    pub quantity: u64,
    pub location: String,
    /// Status as recorded on the contract, e.g. `Open`.
    pub status: String,
}

impl From<GoodsRequest> for GoodsRequestView {
    fn from(r: GoodsRequest) -> Self {
        Self {
            owner: r.owner,
            name: r.name,
            product_type: r.product_type,
            quantity: r.quantity,
            location: r.location,
            status: r.status,
        }
    }
}

/// The supplier's current offer.
#[derive(Debug, Serialize, ToSchema)]
pub struct FillOfferView {
    #[schema(value_type = String)]
    pub supplier: Address,
    #[schema(value_type = String)]
    pub amount: Wei,
    pub invoice_number: u64,
    pub name: String,
    #[schema(value_type = String)]
    pub product_type: ProductType,
    pub quantity: u64,
}

impl From<FillOffer> for FillOfferView {
    fn from(o: FillOffer) -> Self {
        Self {
            supplier: o.supplier,
            amount: o.amount,
            invoice_number: o.invoice_number,
            name: o.name,
            product_type: o.product_type,
            quantity: o.quantity,
        }
    }
}

// -- Routes -------------------------------------------------------------------

/// Build the goods router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{id}/goods-requests", post(register_request))
        .route("/v1/goods-requests/current", get(current_request))
        .route("/v1/sessions/{id}/fill-offers", post(fill_request))
        .route("/v1/fill-offers/current", get(current_offer))
        .route("/v1/sessions/{id}/fill-offers/approve", post(approve_offer))
}

/// POST /v1/sessions/{id}/goods-requests: Register a goods request.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/goods-requests",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = GoodsRequestForm,
    responses(
        (status = 200, description = "Request registered; map pin included when available", body = InteractionResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid form", body = crate::error::ErrorBody),
        (status = 502, description = "Contract rejected the request", body = crate::error::ErrorBody),
    ),
    tag = "goods"
)]
pub(crate) async fn register_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<GoodsRequestForm>, JsonRejection>,
) -> Result<Json<InteractionResponse>, AppError> {
    let handle = interaction::session(&state, &id)?;
    let form = extract_validated_json(body)?;
    if !state.roles.is_beneficiary(&form.owner) {
        return Err(AppError::Validation(format!(
            "{} is not a beneficiary account",
            form.owner
        )));
    }

    let location = RequestLocation::from(form.location);
    let request = NewGoodsRequest::new(
        form.owner.clone(),
        form.name.trim(),
        form.product_type,
        form.quantity,
        &location,
    );
    let opts = CallOptions::sender(form.owner);
    let mut response = interaction::run(
        &state,
        &handle,
        "registerRequest",
        state.gateway.register_request(&request, &opts),
    )
    .await?;
    response.map = interaction::map_pin(&state, &request.location).await;
    Ok(Json(response))
}

/// GET /v1/goods-requests/current: The contract's current request.
#[utoipa::path(
    get,
    path = "/v1/goods-requests/current",
    responses(
        (status = 200, description = "Current request", body = GoodsRequestView),
        (status = 404, description = "No request registered", body = crate::error::ErrorBody),
    ),
    tag = "goods"
)]
pub(crate) async fn current_request(
    State(state): State<AppState>,
) -> Result<Json<GoodsRequestView>, AppError> {
    state
        .gateway
        .view_request()
        .await?
        .map(|r| Json(r.into()))
        .ok_or_else(|| AppError::NotFound("no goods request registered".to_string()))
}

/// POST /v1/sessions/{id}/fill-offers: Offer to fill the current request.
///
/// Sent from the supplier account and signed by the supplier's keystore key.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/fill-offers",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = FillOfferForm,
    responses(
        (status = 200, description = "Offer recorded; map pin of the request included when available", body = InteractionResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid form", body = crate::error::ErrorBody),
        (status = 502, description = "Contract rejected the offer", body = crate::error::ErrorBody),
    ),
    tag = "goods"
)]
pub(crate) async fn fill_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<FillOfferForm>, JsonRejection>,
) -> Result<Json<InteractionResponse>, AppError> {
    let handle = interaction::session(&state, &id)?;
    let form = extract_validated_json(body)?;

    let supplier = state.roles.supplier.clone();
    let opts = CallOptions::sender(supplier.clone()).signed_by(state.roles.supplier_key_id.as_str());
    let mut response = interaction::run(
        &state,
        &handle,
        "fillRequest",
        state
            .gateway
            .fill_request(&supplier, form.amount, form.invoice_number, &opts),
    )
    .await?;

    match state.gateway.view_request().await {
        Ok(Some(request)) => response.map = interaction::map_pin(&state, &request.location).await,
        Ok(None) => {}
        Err(err) => tracing::warn!(error = %err, "request location unavailable for map"),
    }
    Ok(Json(response))
}

/// GET /v1/fill-offers/current: The supplier's current offer.
#[utoipa::path(
    get,
    path = "/v1/fill-offers/current",
    responses(
        (status = 200, description = "Current offer", body = FillOfferView),
        (status = 404, description = "No offer pending", body = crate::error::ErrorBody),
    ),
    tag = "goods"
)]
pub(crate) async fn current_offer(
    State(state): State<AppState>,
) -> Result<Json<FillOfferView>, AppError> {
    state
        .gateway
        .view_fill_offer()
        .await?
        .map(|o| Json(o.into()))
        .ok_or_else(|| AppError::NotFound("no fill offer pending".to_string()))
}

/// POST /v1/sessions/{id}/fill-offers/approve: Approve the current offer.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/fill-offers/approve",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Offer approved", body = InteractionResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
        (status = 502, description = "Contract rejected the approval", body = crate::error::ErrorBody),
    ),
    tag = "goods"
)]
pub(crate) async fn approve_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InteractionResponse>, AppError> {
    let handle = interaction::session(&state, &id)?;
    let opts = CallOptions::sender(state.roles.nonprofit.clone());
    let response = interaction::run(
        &state,
        &handle,
        "approveFillOffer",
        state.gateway.approve_fill_offer(&opts),
    )
    .await?;
    Ok(Json(response))
}
