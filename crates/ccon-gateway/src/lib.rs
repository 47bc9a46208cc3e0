//! # ccon-gateway: Contract Gateway
//!
//! The sole channel for state-changing domain actions and the sole source of
//! truth for request, offer, invoice and cash-request status. Everything
//! authoritative lives in the externally deployed contract; this crate only
//! calls it.
//!
//! ## Implementations
//!
//! - [`HttpContractGateway`]: JSON over HTTP against a contract relay.
//! - [`SimulatedContract`]: in-process stand-in with fault injection.
//!
//! ## Confirmation
//!
//! Mutating operations return a [`PendingTx`] as soon as the relay accepts
//! them. [`wait_for_receipt`] waits for the receipt under a
//! [`ConfirmationPolicy`] and a cancellation token, so a stalled
//! confirmation ends in [`GatewayError::ConfirmationTimeout`] or
//! [`GatewayError::Cancelled`] instead of blocking forever.

pub mod config;
pub mod confirm;
pub mod error;
pub mod http;
pub mod sim;
pub mod traits;
pub mod types;

pub use config::{ConfigError, GatewayConfig};
pub use confirm::{wait_for_receipt, ConfirmationPolicy};
pub use error::GatewayError;
pub use http::HttpContractGateway;
pub use sim::SimulatedContract;
pub use traits::ContractGateway;
pub use types::{
    ApprovedInvoice, BlockInfo, CallOptions, CashRequest, ContractReceipt, FillOffer,
    GoodsRequest, NewGoodsRequest, PendingTx, ProductType, RequestLocation, Signer,
};

pub use tokio_util::sync::CancellationToken;
