//! Contract gateway error types.

use ccon_core::TxHash;

use crate::config::ConfigError;

/// Errors from contract gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The contract rejected or reverted the call. `message` is the relay's
    /// (or contract's) reason, verbatim.
    #[error("contract call {function} failed: {message}")]
    CallFailed { function: String, message: String },

    /// The transaction was not mined within the confirmation bound.
    #[error("transaction {tx_hash} not confirmed after {waited_ms}ms")]
    ConfirmationTimeout { tx_hash: TxHash, waited_ms: u64 },

    /// The wait for confirmation was cancelled by the caller.
    #[error("wait for transaction {tx_hash} was cancelled")]
    Cancelled { tx_hash: TxHash },

    /// The relay could not be reached.
    #[error("gateway transport error at {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The relay answered with a shape this client does not understand.
    #[error("malformed gateway response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    /// Gateway configuration error.
    #[error("gateway configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl GatewayError {
    /// Whether the failure is a domain-level rejection that must be shown to
    /// the user verbatim.
    pub fn is_call_failure(&self) -> bool {
        matches!(self, Self::CallFailed { .. })
    }
}
