//! Oracle configuration.

use url::Url;
use zeroize::Zeroizing;

use crate::error::OracleError;

/// Configuration for the geocoder and the price feed.
///
/// Custom `Debug` implementation redacts the Mapbox token.
#[derive(Clone)]
pub struct OracleConfig {
    /// Mapbox API base. Default: <https://api.mapbox.com>
    pub mapbox_url: Url,
    /// Mapbox access token. Geocoding is disabled without one.
    pub mapbox_token: Option<Zeroizing<String>>,
    /// Spot price API base. Default: <https://api.coinbase.com>
    pub price_url: Url,
    /// Currency pair quoted. Default: `ETH-USD`.
    pub price_pair: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("mapbox_url", &self.mapbox_url)
            .field("mapbox_token", &self.mapbox_token.as_ref().map(|_| "[REDACTED]"))
            .field("price_url", &self.price_url)
            .field("price_pair", &self.price_pair)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OracleConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CCON_MAPBOX_URL` (default: `https://api.mapbox.com`)
    /// - `MAPBOX_ACCESS_TOKEN` (optional)
    /// - `CCON_PRICE_URL` (default: `https://api.coinbase.com`)
    /// - `CCON_PRICE_PAIR` (default: `ETH-USD`)
    /// - `CCON_ORACLE_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Result<Self, OracleError> {
        Ok(Self {
            mapbox_url: env_url("CCON_MAPBOX_URL", "https://api.mapbox.com")?,
            mapbox_token: std::env::var("MAPBOX_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.is_empty())
                .map(Zeroizing::new),
            price_url: env_url("CCON_PRICE_URL", "https://api.coinbase.com")?,
            price_pair: std::env::var("CCON_PRICE_PAIR").unwrap_or_else(|_| "ETH-USD".to_string()),
            timeout_secs: std::env::var("CCON_ORACLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, OracleError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| OracleError::Config(format!("invalid URL for {var}: {e}")))
}

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client, OracleError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| OracleError::Config(format!("failed to build HTTP client: {e}")))
}
