//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor.
//!
//! ## Architecture
//!
//! AppState holds no contract state of its own. Requests, offers, invoices,
//! cash requests and balances are always read from the contract through the
//! [`ContractGateway`]. What the service owns is:
//! - **Sessions**: one [`LedgerSession`] per operator session, each with its
//!   own cancellation token.
//! - **Roles**: which accounts act as donor, non-profit, supplier and
//!   beneficiaries.
//! - **Collaborators**: gateway, content store, ledger mirror, transactor and
//!   the optional display oracles.

use std::collections::HashMap;
use std::sync::Arc;

use ccon_core::Address;
use ccon_gateway::{CancellationToken, ConfirmationPolicy, ContractGateway, GatewayError};
use ccon_ledger::{LedgerMirror, LedgerSession, MirrorPolicy, Transactor};
use ccon_oracle::{Geocoder, PriceFeed};
use ccon_store::ContentStore;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::RoleConfig;

// -- Roles --------------------------------------------------------------------

/// Index of the donor in the node's account list when not configured.
const DONOR_INDEX: usize = 0;
/// Index of the non-profit.
const NONPROFIT_INDEX: usize = 3;
/// Index of the supplier.
const SUPPLIER_INDEX: usize = 4;
/// Range of beneficiary accounts.
const BENEFICIARY_RANGE: std::ops::Range<usize> = 5..10;

/// The accounts each console role acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AccountRoles {
    #[schema(value_type = String)]
    pub donor: Address,
    /// Approves offers, pays invoices, sends cash and owns the ledger pointer.
    #[schema(value_type = String)]
    pub nonprofit: Address,
    #[schema(value_type = String)]
    pub supplier: Address,
    /// Accounts allowed to request goods or cash. Empty means any account.
    #[schema(value_type = Vec<String>)]
    pub beneficiaries: Vec<Address>,
    /// Keystore key that signs the supplier's fill offers.
    pub supplier_key_id: String,
}

/// Role resolution failures.
#[derive(Debug, Error)]
pub enum RoleError {
    #[error("no {role} configured and the node has only {available} accounts")]
    MissingAccount { role: &'static str, available: usize },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl AccountRoles {
    /// Fill unset roles from the node's account list: donor = 0,
    /// non-profit = 3, supplier = 4, beneficiaries = 5..10.
    ///
    /// The gateway is only consulted when a role is unset.
    pub async fn resolve(
        config: &RoleConfig,
        gateway: &dyn ContractGateway,
    ) -> Result<Self, RoleError> {
        let complete = config.donor.is_some()
            && config.nonprofit.is_some()
            && config.supplier.is_some()
            && config.beneficiaries.is_some();
        let accounts = if complete {
            Vec::new()
        } else {
            gateway.accounts().await?
        };

        let pick = |configured: &Option<Address>, index: usize, role: &'static str| {
            configured
                .clone()
                .or_else(|| accounts.get(index).cloned())
                .ok_or(RoleError::MissingAccount {
                    role,
                    available: accounts.len(),
                })
        };

        let roles = Self {
            donor: pick(&config.donor, DONOR_INDEX, "donor")?,
            nonprofit: pick(&config.nonprofit, NONPROFIT_INDEX, "non-profit")?,
            supplier: pick(&config.supplier, SUPPLIER_INDEX, "supplier")?,
            beneficiaries: config.beneficiaries.clone().unwrap_or_else(|| {
                accounts
                    .iter()
                    .skip(BENEFICIARY_RANGE.start)
                    .take(BENEFICIARY_RANGE.len())
                    .cloned()
                    .collect()
            }),
            supplier_key_id: config.supplier_key_id.clone(),
        };
        tracing::info!(
            donor = %roles.donor,
            nonprofit = %roles.nonprofit,
            supplier = %roles.supplier,
            beneficiaries = roles.beneficiaries.len(),
            "account roles resolved"
        );
        Ok(roles)
    }

    /// Whether `address` may request goods or cash.
    pub fn is_beneficiary(&self, address: &Address) -> bool {
        self.beneficiaries.is_empty() || self.beneficiaries.contains(address)
    }
}

// -- Sessions -----------------------------------------------------------------

/// One operator session: its ledger and the token that cancels its waits.
#[derive(Debug)]
pub struct SessionHandle {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Held for the whole of an interaction, so interactions within one
    /// session never overlap.
    pub ledger: tokio::sync::Mutex<LedgerSession>,
    cancel: Mutex<CancellationToken>,
}

impl SessionHandle {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            ledger: tokio::sync::Mutex::new(LedgerSession::new()),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Token for the interaction about to start.
    pub fn token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    /// Cancel every wait in flight and arm a fresh token for later
    /// interactions.
    pub fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.cancel.lock(), CancellationToken::new());
        previous.cancel();
    }

    fn close(&self) {
        self.cancel.lock().cancel();
    }
}

/// Thread-safe, cloneable registry of open sessions.
///
/// The map lock is `parking_lot` and is never held across `.await` points.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<SessionHandle>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session with an empty ledger.
    pub fn create(&self) -> Arc<SessionHandle> {
        let handle = Arc::new(SessionHandle::new(Uuid::new_v4()));
        self.sessions.write().insert(handle.id, Arc::clone(&handle));
        metrics::gauge!("ccon_api_sessions_open").set(self.len() as f64);
        handle
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        self.sessions.read().get(id).cloned()
    }

    /// Close a session, cancelling anything it is waiting on.
    pub fn remove(&self, id: &Uuid) -> Option<Arc<SessionHandle>> {
        let removed = self.sessions.write().remove(id);
        if let Some(handle) = &removed {
            handle.close();
            metrics::gauge!("ccon_api_sessions_open").set(self.len() as f64);
        }
        removed
    }

    /// Cancel the waits of every open session (shutdown).
    pub fn cancel_all(&self) {
        for handle in self.sessions.read().values() {
            handle.close();
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

// -- Application State --------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn ContractGateway>,
    pub store: Arc<dyn ContentStore>,
    pub mirror: LedgerMirror,
    pub transactor: Transactor,
    pub roles: Arc<AccountRoles>,
    pub sessions: SessionRegistry,
    /// Map pins for request locations. `None` disables maps.
    pub geocoder: Option<Arc<dyn Geocoder>>,
    /// Spot prices for USD balance quotes. `None` disables USD figures.
    pub price_feed: Option<Arc<dyn PriceFeed>>,
    pub price_pair: String,
    /// Renders `/metrics`. `None` when no recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store.backend())
            .field("mirror", &self.mirror)
            .field("roles", &self.roles)
            .field("sessions", &self.sessions.len())
            .field("geocoder", &self.geocoder.is_some())
            .field("price_feed", &self.price_feed.is_some())
            .finish()
    }
}

impl AppState {
    /// State over the given gateway and store, with no oracles.
    pub fn new(
        gateway: Arc<dyn ContractGateway>,
        store: Arc<dyn ContentStore>,
        roles: AccountRoles,
        confirmation: ConfirmationPolicy,
    ) -> Self {
        let mirror = LedgerMirror::new(Arc::clone(&gateway), Arc::clone(&store))
            .with_confirmation(confirmation);
        let transactor = Transactor::new(Arc::clone(&gateway), confirmation);
        Self {
            gateway,
            store,
            mirror,
            transactor,
            roles: Arc::new(roles),
            sessions: SessionRegistry::new(),
            geocoder: None,
            price_feed: None,
            price_pair: "ETH-USD".to_string(),
            metrics: None,
        }
    }

    pub fn with_mirror_policy(mut self, policy: MirrorPolicy) -> Self {
        self.mirror = self.mirror.with_policy(policy);
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_price_feed(mut self, feed: Arc<dyn PriceFeed>, pair: impl Into<String>) -> Self {
        self.price_feed = Some(feed);
        self.price_pair = pair.into();
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
