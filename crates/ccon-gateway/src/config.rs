//! Contract gateway configuration.
//!
//! Points the HTTP gateway at a contract relay and bounds confirmation
//! waits. Override via environment variables or explicit construction for
//! testing.

use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::confirm::ConfirmationPolicy;

/// Configuration for the HTTP contract gateway.
///
/// Custom `Debug` implementation redacts the `token` field.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL of the contract relay.
    /// Default: <http://127.0.0.1:8600>
    pub relay_url: Url,
    /// Optional bearer token for the relay.
    pub token: Option<Zeroizing<String>>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Bound and cadence of confirmation waits.
    pub confirmation: ConfirmationPolicy,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("relay_url", &self.relay_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("confirmation", &self.confirmation)
            .finish()
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CCON_GATEWAY_URL` (default: `http://127.0.0.1:8600`)
    /// - `CCON_GATEWAY_TOKEN` (optional)
    /// - `CCON_GATEWAY_TIMEOUT_SECS` (default: 30)
    /// - `CCON_CONFIRMATION_TIMEOUT_SECS` (default: 120)
    /// - `CCON_CONFIRMATION_POLL_MS` (default: 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = ConfirmationPolicy::default();
        Ok(Self {
            relay_url: env_url("CCON_GATEWAY_URL", "http://127.0.0.1:8600")?,
            token: std::env::var("CCON_GATEWAY_TOKEN").ok().map(Zeroizing::new),
            timeout_secs: env_u64("CCON_GATEWAY_TIMEOUT_SECS", 30)?,
            confirmation: ConfirmationPolicy {
                timeout: Duration::from_secs(env_u64(
                    "CCON_CONFIRMATION_TIMEOUT_SECS",
                    defaults.timeout.as_secs(),
                )?),
                poll_interval: Duration::from_millis(env_u64(
                    "CCON_CONFIRMATION_POLL_MS",
                    defaults.poll_interval.as_millis() as u64,
                )?),
            },
        })
    }

    /// A configuration pointing at a local relay (for testing).
    pub fn local(relay_url: Url) -> Self {
        Self {
            relay_url,
            token: None,
            timeout_secs: 5,
            confirmation: ConfirmationPolicy::default(),
        }
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

fn env_u64(var: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError::InvalidNumber(var.to_string(), raw)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {0}: {1:?}")]
    InvalidNumber(String, String),
    #[error("relay token contains characters not allowed in an HTTP header")]
    InvalidToken,
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let mut config = GatewayConfig::local(Url::parse("http://127.0.0.1:1").unwrap());
        config.token = Some(Zeroizing::new("relay-secret".into()));
        let rendered = format!("{config:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("relay-secret"));
    }

    #[test]
    fn local_config_uses_default_confirmation_bounds() {
        let config = GatewayConfig::local(Url::parse("http://127.0.0.1:1").unwrap());
        assert_eq!(config.confirmation.timeout, Duration::from_secs(120));
        assert_eq!(config.confirmation.poll_interval, Duration::from_secs(1));
    }
}
