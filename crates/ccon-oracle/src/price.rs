//! # Price Feed
//!
//! Latest spot price of a currency pair, used only to show balances in USD.
//!
//! [`SpotPriceFeed`] calls `GET {base}/v2/prices/{pair}/spot` and reads
//! `{"data": {"amount": "…"}}`.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use url::Url;

use crate::config::{http_client, OracleConfig};
use crate::error::OracleError;

const SERVICE: &str = "price feed";

/// Latest price of a currency pair.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Latest price of `pair` (e.g. `ETH-USD`) in the quote currency.
    async fn latest_price(&self, pair: &str) -> Result<Decimal, OracleError>;
}

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: String,
}

/// Price feed backed by a spot-price REST API.
#[derive(Debug, Clone)]
pub struct SpotPriceFeed {
    http: reqwest::Client,
    base_url: Url,
}

impl SpotPriceFeed {
    pub fn new(base_url: Url, timeout_secs: u64) -> Result<Self, OracleError> {
        Ok(Self {
            http: http_client(timeout_secs)?,
            base_url,
        })
    }

    pub fn from_config(config: &OracleConfig) -> Result<Self, OracleError> {
        Self::new(config.price_url.clone(), config.timeout_secs)
    }
}

#[async_trait]
impl PriceFeed for SpotPriceFeed {
    async fn latest_price(&self, pair: &str) -> Result<Decimal, OracleError> {
        let url = format!(
            "{}/v2/prices/{pair}/spot",
            self.base_url.as_str().trim_end_matches('/')
        );
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable {
                service: SERVICE,
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(OracleError::Unavailable {
                service: SERVICE,
                reason: format!("HTTP {}", resp.status().as_u16()),
            });
        }

        let body: SpotResponse = resp.json().await.map_err(|e| OracleError::MalformedUpstreamData {
            service: SERVICE,
            reason: e.to_string(),
        })?;
        let price = Decimal::from_str(body.data.amount.trim()).map_err(|e| {
            OracleError::MalformedUpstreamData {
                service: SERVICE,
                reason: format!("amount {:?}: {e}", body.data.amount),
            }
        })?;
        if price.is_sign_negative() {
            return Err(OracleError::MalformedUpstreamData {
                service: SERVICE,
                reason: format!("negative price {price}"),
            });
        }
        tracing::debug!(pair, %price, "spot price");
        Ok(price)
    }
}
