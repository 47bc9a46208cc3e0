//! # Accounts & Balances API
//!
//! Balances are quoted in wei, ether and USD. The ether and USD figures are
//! display-only: a missing price feed or a failed lookup drops them and
//! still answers with the wei balance.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use ccon_core::{Address, Wei};
use ccon_oracle::BalanceQuote;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::{AccountRoles, AppState};

/// Node accounts and the roles assigned to them.
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountsResponse {
    #[schema(value_type = Vec<String>)]
    pub accounts: Vec<Address>,
    pub roles: AccountRoles,
}

/// Balance of one account.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    #[schema(value_type = String)]
    pub address: Address,
    #[schema(value_type = String)]
    pub wei: Wei,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub ether: Option<Decimal>,
    /// Rounded to cents.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub usd: Option<Decimal>,
    /// Currency pair the USD figure was quoted at.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
}

/// Build the accounts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/accounts", get(list_accounts))
        .route("/v1/balances/{address}", get(get_balance))
}

/// GET /v1/accounts: Node accounts and console roles.
#[utoipa::path(
    get,
    path = "/v1/accounts",
    responses(
        (status = 200, description = "Accounts", body = AccountsResponse),
        (status = 503, description = "Relay unreachable", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
pub(crate) async fn list_accounts(
    State(state): State<AppState>,
) -> Result<Json<AccountsResponse>, AppError> {
    let accounts = state.gateway.accounts().await?;
    Ok(Json(AccountsResponse {
        accounts,
        roles: state.roles.as_ref().clone(),
    }))
}

/// GET /v1/balances/{address}: Balance quote for one account.
#[utoipa::path(
    get,
    path = "/v1/balances/{address}",
    params(("address" = String, Path, description = "0x-prefixed account address")),
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 422, description = "Malformed address", body = crate::error::ErrorBody),
    ),
    tag = "accounts"
)]
pub(crate) async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let address = Address::new(address)?;
    let wei = state.gateway.balance(&address).await?;

    let quote = match &state.price_feed {
        Some(feed) => BalanceQuote::fetch(wei, feed.as_ref(), &state.price_pair).await,
        None => BalanceQuote::new(wei, None),
    };
    let response = match quote {
        Ok(quote) => BalanceResponse {
            address,
            wei,
            ether: Some(quote.ether),
            pair: quote.usd.map(|_| state.price_pair.clone()),
            usd: quote.usd,
        },
        Err(err) => {
            tracing::warn!(error = %err, "balance quote unavailable");
            BalanceResponse {
                address,
                wei,
                ether: None,
                usd: None,
                pair: None,
            }
        }
    };
    Ok(Json(response))
}
