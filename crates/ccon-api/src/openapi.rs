//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Community Connect API",
        version = "0.1.0",
        description = "Operator console for a charitable-aid contract: donations, goods and cash requests, supplier offers, invoice payment, balances and the mirrored transaction ledger.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Sessions
        crate::routes::sessions::create_session,
        crate::routes::sessions::get_session,
        crate::routes::sessions::close_session,
        crate::routes::sessions::cancel_session,
        // Donations
        crate::routes::donations::donate,
        // Goods
        crate::routes::goods::register_request,
        crate::routes::goods::current_request,
        crate::routes::goods::fill_request,
        crate::routes::goods::current_offer,
        crate::routes::goods::approve_offer,
        // Invoices
        crate::routes::invoices::approved_invoice,
        crate::routes::invoices::pay_invoice,
        // Cash
        crate::routes::cash::request_cash,
        crate::routes::cash::current_cash_request,
        crate::routes::cash::approve_cash,
        // Accounts
        crate::routes::accounts::list_accounts,
        crate::routes::accounts::get_balance,
        // Ledger
        crate::routes::ledger::get_ledger,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::interaction::InteractionResponse,
        crate::interaction::MirrorReport,
        crate::state::AccountRoles,
        crate::routes::sessions::SessionSummary,
        crate::routes::donations::DonationRequest,
        crate::routes::goods::LocationForm,
        crate::routes::goods::GoodsRequestForm,
        crate::routes::goods::FillOfferForm,
        crate::routes::goods::GoodsRequestView,
        crate::routes::goods::FillOfferView,
        crate::routes::invoices::ApprovedInvoiceView,
        crate::routes::invoices::PayInvoiceForm,
        crate::routes::cash::CashRequestForm,
        crate::routes::cash::CashRequestView,
        crate::routes::accounts::AccountsResponse,
        crate::routes::accounts::BalanceResponse,
        crate::routes::ledger::LedgerResponse,
        crate::routes::ledger::LedgerStatus,
    )),
    tags(
        (name = "sessions", description = "Operator sessions"),
        (name = "donations", description = "Donor deposits"),
        (name = "goods", description = "Goods requests and supplier offers"),
        (name = "invoices", description = "Approved invoices and payment"),
        (name = "cash", description = "Cash assistance"),
        (name = "accounts", description = "Accounts, roles and balances"),
        (name = "ledger", description = "Persisted transaction ledger"),
    )
)]
pub struct ApiDoc;

/// Router serving the spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
