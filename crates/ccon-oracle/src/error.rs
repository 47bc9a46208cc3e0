//! Oracle error types.
//!
//! Every oracle failure is display-only: callers drop the map or price and
//! carry on.

use ccon_core::Wei;

/// Errors from geocoding and price lookups.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The upstream service could not be reached or returned an error status.
    #[error("{service} unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },

    /// The upstream service answered with an unexpected shape.
    #[error("malformed {service} response: {reason}")]
    MalformedUpstreamData {
        service: &'static str,
        reason: String,
    },

    /// A balance too large to express in display units.
    #[error("balance of {0} wei is out of range for display")]
    OutOfRange(Wei),

    /// Oracle configuration error.
    #[error("oracle configuration error: {0}")]
    Config(String),
}
