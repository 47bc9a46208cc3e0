//! # Donation API
//!
//! A donation is a payable `deposit` from the donor account; the attached
//! value equals the amount.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use ccon_core::Wei;
use ccon_gateway::CallOptions;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::interaction::{self, InteractionResponse};
use crate::state::AppState;

/// Donation form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DonationRequest {
    /// Amount in wei, as a decimal string or integer.
    #[schema(value_type = String, example = "1000000000000000000")]
    pub amount: Wei,
}

impl Validate for DonationRequest {
    fn validate(&self) -> Result<(), String> {
        if self.amount == Wei::ZERO {
            return Err("amount must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Build the donations router.
pub fn router() -> Router<AppState> {
    Router::new().route("/v1/sessions/{id}/donations", post(donate))
}

/// POST /v1/sessions/{id}/donations: Deposit from the donor.
#[utoipa::path(
    post,
    path = "/v1/sessions/{id}/donations",
    params(("id" = Uuid, Path, description = "Session ID")),
    request_body = DonationRequest,
    responses(
        (status = 200, description = "Deposit confirmed and recorded", body = InteractionResponse),
        (status = 404, description = "Unknown session", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid amount", body = crate::error::ErrorBody),
        (status = 502, description = "Contract rejected the deposit", body = crate::error::ErrorBody),
        (status = 504, description = "Deposit not confirmed in time", body = crate::error::ErrorBody),
    ),
    tag = "donations"
)]
pub(crate) async fn donate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<DonationRequest>, JsonRejection>,
) -> Result<Json<InteractionResponse>, AppError> {
    let handle = interaction::session(&state, &id)?;
    let req = extract_validated_json(body)?;

    let opts = CallOptions::sender(state.roles.donor.clone()).with_value(req.amount);
    let response = interaction::run(
        &state,
        &handle,
        "deposit",
        state.gateway.deposit(req.amount, &opts),
    )
    .await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_donation_is_rejected() {
        let req = DonationRequest { amount: Wei::ZERO };
        assert!(req.validate().is_err());
    }

    #[test]
    fn amount_accepts_string_or_integer() {
        let a: DonationRequest = serde_json::from_str(r#"{"amount":"250"}"#).unwrap();
        let b: DonationRequest = serde_json::from_str(r#"{"amount":250}"#).unwrap();
        assert_eq!(a.amount, b.amount);
        assert!(a.validate().is_ok());
    }
}
