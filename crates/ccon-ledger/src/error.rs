//! Ledger mirror error types.

use ccon_core::{ContentAddress, LedgerFormatError};
use ccon_gateway::GatewayError;
use ccon_store::StoreError;

/// Errors from mirroring the session ledger.
///
/// Content store and format failures always occur before the pointer write,
/// so the contract never references content that was not stored.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// Reading or writing the pointer on the contract failed.
    #[error("ledger pointer {stage} failed: {source}")]
    Gateway {
        /// `read` or `write`.
        stage: &'static str,
        #[source]
        source: GatewayError,
    },

    /// The pointer write was submitted but its confirmation timed out or was
    /// cancelled. The write may still be mined and reference `pointer`.
    #[error("ledger pointer write to {pointer} unconfirmed: {source}")]
    Unconfirmed {
        pointer: ContentAddress,
        #[source]
        source: GatewayError,
    },

    /// Fetching the previous snapshot or publishing the merged one failed.
    #[error("content store {stage} failed: {source}")]
    ContentStore {
        /// `fetch` or `publish`.
        stage: &'static str,
        #[source]
        source: StoreError,
    },

    /// The previous snapshot could not be decoded, or the merged one encoded.
    #[error("ledger snapshot format error: {0}")]
    Format(#[from] LedgerFormatError),

    /// Compare-and-swap: the pointer changed between the initial read and
    /// the write.
    #[error("ledger pointer moved from {expected:?} to {found:?} during mirror")]
    PointerMoved {
        expected: Option<ContentAddress>,
        found: Option<ContentAddress>,
    },
}

impl MirrorError {
    /// Short label for metrics and logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Gateway { stage: "read", .. } => "pointer_read",
            Self::Gateway { .. } | Self::Unconfirmed { .. } => "pointer_write",
            Self::ContentStore { stage: "fetch", .. } => "fetch",
            Self::ContentStore { .. } => "publish",
            Self::Format(_) => "format",
            Self::PointerMoved { .. } => "pointer_moved",
        }
    }

    /// Whether the pointer write was reached. When `false` the contract's
    /// pointer is guaranteed unchanged.
    pub fn reached_pointer_write(&self) -> bool {
        matches!(
            self,
            Self::Gateway { stage: "write", .. } | Self::Unconfirmed { .. }
        )
    }

    /// Snapshot address of a pointer write that may still be mined.
    pub fn unconfirmed_pointer(&self) -> Option<&ContentAddress> {
        match self {
            Self::Unconfirmed { pointer, .. } => Some(pointer),
            _ => None,
        }
    }
}
