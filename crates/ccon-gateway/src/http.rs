//! # HTTP Contract Gateway
//!
//! Talks JSON to a contract relay that owns the node connection, the ABI and
//! any keystore. No key material passes through this process.
//!
//! ## Relay API
//!
//! | Method | Path                                  | Operation                      |
//! |--------|---------------------------------------|--------------------------------|
//! | POST   | `/v1/contract/calls/{function}`       | Submit a mutating call         |
//! | GET    | `/v1/contract/views/{function}`       | Read-only call                 |
//! | GET    | `/v1/transactions/{hash}/receipt`     | Receipt (404 while pending)    |
//! | GET    | `/v1/accounts`                        | Node accounts                  |
//! | GET    | `/v1/accounts/{address}/balance`      | Balance in wei                 |
//! | GET    | `/v1/blocks/latest`                   | Latest block header            |
//!
//! A call body is `{"from", "value"?, "signer", "args": [...]}` and the
//! response is `{"tx_hash"}`. Views respond with `{"result": ...}` where the
//! result is the contract's return tuple as a JSON array. A non-2xx response
//! to a call or view is a [`GatewayError::CallFailed`] carrying the relay's
//! message verbatim. Requests are one-shot.

use std::time::Duration;

use async_trait::async_trait;
use ccon_core::{Address, ContentAddress, TxHash, Wei};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{ConfigError, GatewayConfig};
use crate::error::GatewayError;
use crate::traits::ContractGateway;
use crate::types::{
    ApprovedInvoice, ApprovedInvoiceTuple, BlockInfo, CallOptions, CashRequest,
    CashRequestTuple, ContractReceipt, FillOffer, FillOfferTuple, GoodsRequest,
    GoodsRequestTuple, NewGoodsRequest, PendingTx,
};

#[derive(Debug, Serialize)]
struct CallBody<'a> {
    #[serde(flatten)]
    opts: &'a CallOptions,
    args: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CallResponse {
    tx_hash: TxHash,
}

#[derive(Debug, Deserialize)]
struct ViewResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
struct AccountsResponse {
    accounts: Vec<Address>,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: Wei,
}

/// Relay error body. Relays answer either `{"message": ...}`,
/// `{"error": ...}` or plain text.
#[derive(Debug, Deserialize)]
struct RelayError {
    #[serde(alias = "error")]
    message: String,
}

/// Contract gateway backed by an HTTP relay.
#[derive(Debug, Clone)]
pub struct HttpContractGateway {
    http: reqwest::Client,
    base_url: url::Url,
}

impl HttpContractGateway {
    /// Build a gateway from configuration.
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(token) = &config.token {
            let value =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {}", token.as_str()))
                    .map_err(|_| ConfigError::InvalidToken)?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.relay_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Submit a mutating call.
    async fn call(
        &self,
        function: &str,
        args: serde_json::Value,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        let endpoint = format!("POST /v1/contract/calls/{function}");
        let url = self.url(&format!("/v1/contract/calls/{function}"));

        let resp = self
            .http
            .post(&url)
            .json(&CallBody { opts, args })
            .send()
            .await
            .map_err(|e| transport(&endpoint, e))?;

        if !resp.status().is_success() {
            return Err(call_failed(function, resp).await);
        }

        let body: CallResponse = resp.json().await.map_err(|e| malformed(&endpoint, e))?;
        tracing::info!(function, tx_hash = %body.tx_hash, from = %opts.from, "contract call submitted");
        Ok(PendingTx {
            tx_hash: body.tx_hash,
            function: function.to_string(),
        })
    }

    /// Read-only call.
    async fn view<T: DeserializeOwned>(&self, function: &str) -> Result<T, GatewayError> {
        let endpoint = format!("GET /v1/contract/views/{function}");
        let url = self.url(&format!("/v1/contract/views/{function}"));

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport(&endpoint, e))?;

        if !resp.status().is_success() {
            return Err(call_failed(function, resp).await);
        }

        let body: ViewResponse<T> = resp.json().await.map_err(|e| malformed(&endpoint, e))?;
        Ok(body.result)
    }

    /// GET a chain query. `Ok(None)` on 404.
    async fn query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
    ) -> Result<Option<T>, GatewayError> {
        let resp = self
            .http
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| transport(endpoint, e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Transport {
                endpoint: endpoint.to_string(),
                reason: format!("HTTP {status}: {body}"),
            });
        }

        resp.json()
            .await
            .map(Some)
            .map_err(|e| malformed(endpoint, e))
    }

    async fn required<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        path: &str,
    ) -> Result<T, GatewayError> {
        self.query(endpoint, path)
            .await?
            .ok_or_else(|| GatewayError::Malformed {
                endpoint: endpoint.to_string(),
                reason: "relay returned 404".to_string(),
            })
    }
}

fn transport(endpoint: &str, err: reqwest::Error) -> GatewayError {
    GatewayError::Transport {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    }
}

fn malformed(endpoint: &str, err: impl std::fmt::Display) -> GatewayError {
    GatewayError::Malformed {
        endpoint: endpoint.to_string(),
        reason: err.to_string(),
    }
}

async fn call_failed(function: &str, resp: reqwest::Response) -> GatewayError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<RelayError>(&body) {
        Ok(err) => err.message,
        Err(_) if body.trim().is_empty() => format!("relay returned HTTP {status}"),
        Err(_) => body.trim().to_string(),
    };
    tracing::warn!(function, status, %message, "contract call rejected");
    GatewayError::CallFailed {
        function: function.to_string(),
        message,
    }
}

#[async_trait]
impl ContractGateway for HttpContractGateway {
    async fn deposit(&self, amount: Wei, opts: &CallOptions) -> Result<PendingTx, GatewayError> {
        self.call("deposit", json!([amount]), opts).await
    }

    async fn register_request(
        &self,
        request: &NewGoodsRequest,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        let args = json!([
            request.owner,
            request.name,
            request.product_type,
            request.quantity,
            request.location,
        ]);
        self.call("registerRequest", args, opts).await
    }

    async fn view_request(&self) -> Result<Option<GoodsRequest>, GatewayError> {
        let tuple: GoodsRequestTuple = self.view("viewRequest").await?;
        tuple
            .into_view()
            .map_err(|e| malformed("GET /v1/contract/views/viewRequest", e))
    }

    async fn fill_request(
        &self,
        supplier: &Address,
        amount: Wei,
        invoice_number: u64,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.call("fillRequest", json!([supplier, amount, invoice_number]), opts)
            .await
    }

    async fn view_fill_offer(&self) -> Result<Option<FillOffer>, GatewayError> {
        let tuple: FillOfferTuple = self.view("viewFillOffer").await?;
        tuple
            .into_view()
            .map_err(|e| malformed("GET /v1/contract/views/viewFillOffer", e))
    }

    async fn approve_fill_offer(&self, opts: &CallOptions) -> Result<PendingTx, GatewayError> {
        self.call("approveFillOffer", json!([]), opts).await
    }

    async fn view_approved_invoice(&self) -> Result<Option<ApprovedInvoice>, GatewayError> {
        let tuple: ApprovedInvoiceTuple = self.view("viewApprovedInvoice").await?;
        Ok(tuple.into_view())
    }

    async fn pay_invoice(
        &self,
        invoice_number: u64,
        received: bool,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.call("payInvoice", json!([invoice_number, received]), opts)
            .await
    }

    async fn request_cash(
        &self,
        amount: Wei,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.call("requestCash", json!([amount]), opts).await
    }

    async fn view_cash_request(&self) -> Result<Option<CashRequest>, GatewayError> {
        let tuple: CashRequestTuple = self.view("viewCashRequest").await?;
        Ok(tuple.into_view())
    }

    async fn send_cash(
        &self,
        amount: Wei,
        requester: &Address,
        approver: &Address,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.call("sendCash", json!([amount, requester, approver]), opts)
            .await
    }

    async fn ipfs_hash(&self) -> Result<Option<ContentAddress>, GatewayError> {
        let raw: String = self.view("getIPFSHash").await?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        ContentAddress::new(raw)
            .map(Some)
            .map_err(|e| malformed("GET /v1/contract/views/getIPFSHash", e))
    }

    async fn set_ipfs_hash(
        &self,
        address: &ContentAddress,
        opts: &CallOptions,
    ) -> Result<PendingTx, GatewayError> {
        self.call("setIPFSHash", json!([address]), opts).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, GatewayError> {
        let body: AccountsResponse = self.required("GET /v1/accounts", "/v1/accounts").await?;
        Ok(body.accounts)
    }

    async fn balance(&self, address: &Address) -> Result<Wei, GatewayError> {
        let endpoint = format!("GET /v1/accounts/{address}/balance");
        let body: BalanceResponse = self
            .required(&endpoint, &format!("/v1/accounts/{address}/balance"))
            .await?;
        Ok(body.balance)
    }

    async fn latest_block(&self) -> Result<BlockInfo, GatewayError> {
        self.required("GET /v1/blocks/latest", "/v1/blocks/latest")
            .await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: &TxHash,
    ) -> Result<Option<ContractReceipt>, GatewayError> {
        let endpoint = format!("GET /v1/transactions/{tx_hash}/receipt");
        self.query(&endpoint, &format!("/v1/transactions/{tx_hash}/receipt"))
            .await
    }
}
