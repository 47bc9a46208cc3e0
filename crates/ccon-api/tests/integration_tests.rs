//! # Integration Tests for ccon-api
//!
//! Drives the router end to end over a simulated contract and an in-memory
//! content store: sessions, every interaction route, ledger mirroring and
//! its degraded path, confirmation timeouts and cancellation, balances and
//! the OpenAPI document.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use ccon_api::config::RoleConfig;
use ccon_api::state::{AccountRoles, AppState};
use ccon_gateway::{ConfirmationPolicy, SimulatedContract};
use ccon_oracle::{Coordinates, Geocoder, OracleError, PriceFeed};
use ccon_store::MemContentStore;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

const ONE_ETHER: &str = "1000000000000000000";

struct FixedGeocoder;

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn lookup(&self, _address: &str) -> Result<Coordinates, OracleError> {
        Ok(Coordinates {
            latitude: 33.4152,
            longitude: -111.8315,
        })
    }
}

struct FixedPrice;

#[async_trait]
impl PriceFeed for FixedPrice {
    async fn latest_price(&self, _pair: &str) -> Result<Decimal, OracleError> {
        Ok(Decimal::from_str("2000").unwrap())
    }
}

struct Harness {
    app: axum::Router,
    sim: Arc<SimulatedContract>,
    store: Arc<MemContentStore>,
    roles: AccountRoles,
}

async fn harness_with(timeout: Duration) -> Harness {
    let sim = Arc::new(SimulatedContract::new());
    let store = Arc::new(MemContentStore::new());
    let roles = AccountRoles::resolve(&RoleConfig::default(), sim.as_ref())
        .await
        .unwrap();
    let confirmation = ConfirmationPolicy {
        timeout,
        poll_interval: Duration::from_millis(10),
    };
    let state = AppState::new(sim.clone(), store.clone(), roles.clone(), confirmation)
        .with_geocoder(Arc::new(FixedGeocoder))
        .with_price_feed(Arc::new(FixedPrice), "ETH-USD");
    Harness {
        app: ccon_api::app(state),
        sim,
        store,
        roles,
    }
}

async fn harness() -> Harness {
    harness_with(Duration::from_secs(5)).await
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

impl Harness {
    async fn send(&self, request: Request<Body>) -> axum::http::Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn open_session(&self) -> String {
        let response = self.send(post_empty("/v1/sessions")).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_str().unwrap().to_string()
    }

    async fn donate(&self, session: &str, amount: &str) -> axum::http::Response<Body> {
        self.send(post(
            &format!("/v1/sessions/{session}/donations"),
            json!({ "amount": amount }),
        ))
        .await
    }

    fn goods_form(&self, product_type: &str, quantity: u64) -> Value {
        json!({
            "owner": self.roles.beneficiaries[0].to_string(),
            "name": "Diapers",
            "product_type": product_type,
            "quantity": quantity,
            "location": {
                "street": "1 Main St",
                "city": "Mesa",
                "state": "AZ",
                "zip": "85201"
            }
        })
    }
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let h = harness().await;
    let response = h.send(get("/health/liveness")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let h = harness().await;
    let response = h.send(get("/health/readiness")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

#[tokio::test]
async fn test_metrics_without_recorder_is_unavailable() {
    let h = harness().await;
    let response = h.send(get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// -- Sessions -----------------------------------------------------------------

#[tokio::test]
async fn test_session_lifecycle() {
    let h = harness().await;
    let id = h.open_session().await;

    let response = h.send(get(&format!("/v1/sessions/{id}"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["pending"].as_array().unwrap().len(), 0);
    assert_eq!(body["mirrored_rows"], 0);

    let response = h
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/sessions/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = h.send(get(&format!("/v1/sessions/{id}"))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_interaction_on_unknown_session_is_404() {
    let h = harness().await;
    let response = h
        .donate("00000000-0000-0000-0000-000000000000", ONE_ETHER)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

// -- Donations & Mirroring ----------------------------------------------------

#[tokio::test]
async fn test_donation_records_row_and_mirrors_ledger() {
    let h = harness().await;
    let id = h.open_session().await;

    let response = h.donate(&id, ONE_ETHER).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["function"], "deposit");
    assert_eq!(body["row"]["From"], h.roles.donor.to_string());
    assert_eq!(body["row"]["Contract Balance"], ONE_ETHER);
    assert_eq!(body["mirror"]["status"], "ok");
    assert_eq!(body["mirror"]["pointer_written"], true);
    assert_eq!(body["ledger"].as_array().unwrap().len(), 1);

    let pointer = h.sim.pointer().expect("pointer written");
    assert_eq!(body["mirror"]["pointer"], pointer.to_string());
    assert!(h.store.contains(&pointer));

    let response = h.send(get("/v1/ledger")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let ledger = body_json(response).await;
    assert_eq!(ledger["status"], "ok");
    assert_eq!(ledger["pointer"], pointer.to_string());
    assert_eq!(ledger["columns"].as_array().unwrap().len(), 6);
    assert_eq!(ledger["rows"].as_array().unwrap().len(), 1);

    let session = body_json(h.send(get(&format!("/v1/sessions/{id}"))).await).await;
    assert_eq!(session["pending"].as_array().unwrap().len(), 0);
    assert_eq!(session["mirrored_rows"], 1);
    assert_eq!(session["last_pointer"], pointer.to_string());
}

#[tokio::test]
async fn test_sessions_append_to_one_persisted_ledger() {
    let h = harness().await;
    let first = h.open_session().await;
    let second = h.open_session().await;

    h.donate(&first, ONE_ETHER).await;
    let body = body_json(h.donate(&second, ONE_ETHER).await).await;
    assert_eq!(body["mirror"]["status"], "ok");
    assert_eq!(body["ledger"].as_array().unwrap().len(), 2);
    assert!(body["mirror"]["previous_pointer"].is_string());
    assert_eq!(h.sim.pointer_writes(), 2);
}

#[tokio::test]
async fn test_zero_donation_is_rejected() {
    let h = harness().await;
    let id = h.open_session().await;
    let response = h.donate(&id, "0").await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let h = harness().await;
    let id = h.open_session().await;
    let response = h
        .send(
            Request::builder()
                .method("POST")
                .uri(format!("/v1/sessions/{id}/donations"))
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_outage_degrades_mirror_then_recovers() {
    let h = harness().await;
    let id = h.open_session().await;

    h.store.set_available(false);
    let response = h.donate(&id, ONE_ETHER).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["mirror"]["status"], "failed");
    assert!(body["mirror"]["error"].is_string());
    assert_eq!(body["ledger"].as_array().unwrap().len(), 1);
    assert!(h.sim.pointer().is_none());

    let session = body_json(h.send(get(&format!("/v1/sessions/{id}"))).await).await;
    assert_eq!(session["pending"].as_array().unwrap().len(), 1);

    h.store.set_available(true);
    let body = body_json(h.donate(&id, ONE_ETHER).await).await;
    assert_eq!(body["mirror"]["status"], "ok");
    assert_eq!(body["ledger"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_ledger_view_degrades_while_store_is_down() {
    let h = harness().await;
    let id = h.open_session().await;
    h.donate(&id, ONE_ETHER).await;
    let pointer = h.sim.pointer().expect("pointer written");

    h.store.set_available(false);
    let response = h.send(get("/v1/ledger")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let ledger = body_json(response).await;
    assert_eq!(ledger["status"], "unavailable");
    assert_eq!(ledger["pointer"], pointer.to_string());
    assert_eq!(ledger["rows"].as_array().unwrap().len(), 0);

    h.store.set_available(true);
    let ledger = body_json(h.send(get("/v1/ledger")).await).await;
    assert_eq!(ledger["status"], "ok");
    assert_eq!(ledger["rows"].as_array().unwrap().len(), 1);
}

// -- Failures -----------------------------------------------------------------

#[tokio::test]
async fn test_contract_revert_is_reported_verbatim() {
    let h = harness().await;
    let id = h.open_session().await;
    h.sim.fail_function("deposit", "execution reverted: contract paused");

    let response = h.donate(&id, ONE_ETHER).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CONTRACT_CALL_FAILED");
    assert_eq!(body["error"]["message"], "execution reverted: contract paused");
    assert_eq!(body["error"]["details"]["function"], "deposit");

    let session = body_json(h.send(get(&format!("/v1/sessions/{id}"))).await).await;
    assert_eq!(session["pending"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_unconfirmed_transaction_times_out() {
    let h = harness_with(Duration::from_millis(100)).await;
    let id = h.open_session().await;
    h.sim.withhold_confirmations(true);

    let response = h.donate(&id, ONE_ETHER).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "CONFIRMATION_TIMEOUT");
}

#[tokio::test]
async fn test_cancel_interrupts_confirmation_wait() {
    let h = harness().await;
    let id = h.open_session().await;
    h.sim.withhold_confirmations(true);

    let app = h.app.clone();
    let uri = format!("/v1/sessions/{id}/donations");
    let in_flight = tokio::spawn(async move {
        app.oneshot(post(&uri, json!({ "amount": ONE_ETHER })))
            .await
            .unwrap()
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let busy = h.send(get(&format!("/v1/sessions/{id}"))).await;
    assert_eq!(busy.status(), StatusCode::CONFLICT);

    let response = h
        .send(post_empty(&format!("/v1/sessions/{id}/cancel")))
        .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = in_flight.await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    h.sim.withhold_confirmations(false);
    h.sim.release_withheld();
    let response = h.donate(&id, ONE_ETHER).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// -- Goods Workflow -----------------------------------------------------------

#[tokio::test]
async fn test_goods_request_through_payment() {
    let h = harness().await;
    let id = h.open_session().await;
    h.donate(&id, ONE_ETHER).await;

    let response = h
        .send(post(
            &format!("/v1/sessions/{id}/goods-requests"),
            h.goods_form("Supplies", 3),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["function"], "registerRequest");
    assert_eq!(body["map"]["title"], "1 Main St Mesa AZ 85201");
    assert_eq!(body["map"]["marker"], "car");

    let current = body_json(h.send(get("/v1/goods-requests/current")).await).await;
    assert_eq!(current["status"], "Open");
    assert_eq!(current["quantity"], 3);

    let response = h
        .send(post(
            &format!("/v1/sessions/{id}/fill-offers"),
            json!({ "amount": "500", "invoice_number": 7 }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["row"]["From"], h.roles.supplier.to_string());
    assert!(body["map"].is_object());

    let offer = body_json(h.send(get("/v1/fill-offers/current")).await).await;
    assert_eq!(offer["invoice_number"], 7);
    assert_eq!(offer["amount"], "500");

    let response = h
        .send(post_empty(&format!("/v1/sessions/{id}/fill-offers/approve")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let invoice = body_json(h.send(get("/v1/invoices/approved")).await).await;
    assert_eq!(invoice["invoice_number"], 7);

    let response = h
        .send(post(&format!("/v1/sessions/{id}/invoices/pay"), json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["function"], "payInvoice");
    assert_eq!(body["ledger"].as_array().unwrap().len(), 5);

    let current = body_json(h.send(get("/v1/goods-requests/current")).await).await;
    assert_eq!(current["status"], "Paid");

    let response = h.send(get("/v1/invoices/approved")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_product_type_is_422() {
    let h = harness().await;
    let id = h.open_session().await;
    let response = h
        .send(post(
            &format!("/v1/sessions/{id}/goods-requests"),
            h.goods_form("Boat", 1),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_zero_quantity_goods_is_422_but_rides_are_fine() {
    let h = harness().await;
    let id = h.open_session().await;
    let response = h
        .send(post(
            &format!("/v1/sessions/{id}/goods-requests"),
            h.goods_form("Food", 0),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let response = h
        .send(post(
            &format!("/v1/sessions/{id}/goods-requests"),
            h.goods_form("Ride", 0),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_beneficiary_cannot_request_goods() {
    let h = harness().await;
    let id = h.open_session().await;
    let mut form = h.goods_form("Food", 1);
    form["owner"] = json!(h.roles.donor.to_string());
    let response = h
        .send(post(&format!("/v1/sessions/{id}/goods-requests"), form))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_views_are_404_before_anything_is_registered() {
    let h = harness().await;
    for uri in [
        "/v1/goods-requests/current",
        "/v1/fill-offers/current",
        "/v1/invoices/approved",
        "/v1/cash-requests/current",
    ] {
        let response = h.send(get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_paying_without_approved_invoice_is_conflict() {
    let h = harness().await;
    let id = h.open_session().await;
    let response = h
        .send(post(&format!("/v1/sessions/{id}/invoices/pay"), json!({})))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// -- Cash ---------------------------------------------------------------------

#[tokio::test]
async fn test_cash_request_and_approval() {
    let h = harness().await;
    let id = h.open_session().await;
    h.donate(&id, ONE_ETHER).await;
    let requester = h.roles.beneficiaries[1].to_string();

    let response = h
        .send(post(
            &format!("/v1/sessions/{id}/cash-requests"),
            json!({ "requester": requester, "amount": "1000" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["row"]["From"], requester.as_str());

    let current = body_json(h.send(get("/v1/cash-requests/current")).await).await;
    assert_eq!(current["amount"], "1000");

    let response = h
        .send(post_empty(&format!("/v1/sessions/{id}/cash-requests/approve")))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["function"], "sendCash");
    assert_eq!(body["row"]["From"], h.roles.nonprofit.to_string());

    let response = h.send(get("/v1/cash-requests/current")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_approving_without_cash_request_is_conflict() {
    let h = harness().await;
    let id = h.open_session().await;
    let response = h
        .send(post_empty(&format!("/v1/sessions/{id}/cash-requests/approve")))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// -- Accounts & Balances ------------------------------------------------------

#[tokio::test]
async fn test_accounts_list_roles() {
    let h = harness().await;
    let response = h.send(get("/v1/accounts")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["accounts"].as_array().unwrap().len(), 10);
    assert_eq!(body["roles"]["nonprofit"], h.roles.nonprofit.to_string());
    assert_eq!(body["roles"]["beneficiaries"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_balance_is_quoted_in_usd() {
    let h = harness().await;
    let response = h
        .send(get(&format!("/v1/balances/{}", h.roles.supplier)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["wei"], "100000000000000000000");
    assert_eq!(body["ether"], "100");
    assert_eq!(body["usd"], "200000");
    assert_eq!(body["pair"], "ETH-USD");
}

#[tokio::test]
async fn test_malformed_balance_address_is_422() {
    let h = harness().await;
    let response = h.send(get("/v1/balances/0x1234")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_document_is_served() {
    let h = harness().await;
    let response = h.send(get("/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["info"]["title"], "Community Connect API");
    assert!(body["paths"]["/v1/sessions/{id}/goods-requests"].is_object());
    assert!(body["paths"]["/v1/balances/{address}"].is_object());
}
