//! # Service Configuration
//!
//! Everything the service reads from the environment, gathered in one place
//! and validated at startup. Each collaborator keeps its own `from_env()`
//! (`GatewayConfig`, `StoreConfig`, `OracleConfig`); this module adds the
//! listen port, the mirror policy and the role addresses.
//!
//! Variables read here:
//! - `PORT` (default: 8080)
//! - `CCON_MIRROR_POLICY` (`last-writer-wins` | `compare-and-swap`)
//! - `CCON_DONOR_ADDRESS`, `CCON_NONPROFIT_ADDRESS`, `CCON_SUPPLIER_ADDRESS`
//! - `CCON_BENEFICIARY_ADDRESSES` (comma-separated)
//! - `CCON_SUPPLIER_KEY_ID` (default: `supplier`)

use ccon_core::{Address, ValidationError};
use ccon_gateway::{ConfigError, GatewayConfig};
use ccon_ledger::MirrorPolicy;
use ccon_oracle::{OracleConfig, OracleError};
use ccon_store::{StoreConfig, StoreError};
use thiserror::Error;

/// Default keystore key used to sign `fillRequest`.
pub const DEFAULT_SUPPLIER_KEY_ID: &str = "supplier";

/// Role addresses as configured. Unset roles are resolved from the node's
/// account list at startup (see [`crate::state::AccountRoles::resolve`]).
#[derive(Debug, Clone)]
pub struct RoleConfig {
    pub donor: Option<Address>,
    pub nonprofit: Option<Address>,
    pub supplier: Option<Address>,
    pub beneficiaries: Option<Vec<Address>>,
    /// Relay keystore key that signs the supplier's fill offers.
    pub supplier_key_id: String,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            donor: None,
            nonprofit: None,
            supplier: None,
            beneficiaries: None,
            supplier_key_id: DEFAULT_SUPPLIER_KEY_ID.to_string(),
        }
    }
}

impl RoleConfig {
    /// Load role addresses from the environment.
    pub fn from_env() -> Result<Self, AppConfigError> {
        let beneficiaries = match std::env::var("CCON_BENEFICIARY_ADDRESSES") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.split(',')
                    .map(|s| parse_address("CCON_BENEFICIARY_ADDRESSES", s.trim()))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            _ => None,
        };
        Ok(Self {
            donor: env_address("CCON_DONOR_ADDRESS")?,
            nonprofit: env_address("CCON_NONPROFIT_ADDRESS")?,
            supplier: env_address("CCON_SUPPLIER_ADDRESS")?,
            beneficiaries,
            supplier_key_id: std::env::var("CCON_SUPPLIER_KEY_ID")
                .ok()
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| DEFAULT_SUPPLIER_KEY_ID.to_string()),
        })
    }
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub gateway: GatewayConfig,
    pub store: StoreConfig,
    pub oracle: OracleConfig,
    pub roles: RoleConfig,
    pub mirror_policy: MirrorPolicy,
}

impl AppConfig {
    /// Load and validate the whole configuration from the environment.
    pub fn from_env() -> Result<Self, AppConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| AppConfigError::InvalidPort(raw))?,
            Err(_) => 8080,
        };
        let mirror_policy = match std::env::var("CCON_MIRROR_POLICY") {
            Ok(raw) => raw.parse().map_err(AppConfigError::InvalidPolicy)?,
            Err(_) => MirrorPolicy::default(),
        };
        Ok(Self {
            port,
            gateway: GatewayConfig::from_env()?,
            store: StoreConfig::from_env()?,
            oracle: OracleConfig::from_env()?,
            roles: RoleConfig::from_env()?,
            mirror_policy,
        })
    }
}

fn env_address(var: &str) -> Result<Option<Address>, AppConfigError> {
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => parse_address(var, raw.trim()).map(Some),
        _ => Ok(None),
    }
}

fn parse_address(var: &str, raw: &str) -> Result<Address, AppConfigError> {
    Address::new(raw).map_err(|source| AppConfigError::InvalidAddress {
        var: var.to_string(),
        source,
    })
}

/// Configuration errors. Fatal at startup.
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("invalid PORT: {0:?}")]
    InvalidPort(String),

    #[error("invalid CCON_MIRROR_POLICY: {0}")]
    InvalidPolicy(String),

    #[error("invalid address in {var}: {source}")]
    InvalidAddress {
        var: String,
        #[source]
        source: ValidationError,
    },

    #[error("gateway configuration: {0}")]
    Gateway(#[from] ConfigError),

    #[error("content store configuration: {0}")]
    Store(#[from] StoreError),

    #[error("oracle configuration: {0}")]
    Oracle(#[from] OracleError),
}
