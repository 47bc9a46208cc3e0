//! Content store error types.

use ccon_core::ContentAddress;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("content store unavailable during {operation}: {reason}")]
    Unavailable {
        /// `publish` or `fetch`.
        operation: &'static str,
        /// Transport or backend message.
        reason: String,
    },

    /// Nothing is stored at the requested address.
    #[error("no content stored at {0}")]
    NotFound(ContentAddress),

    /// Retrieved bytes do not hash to the requested address.
    #[error("integrity violation at {address}: content hashes to {actual}")]
    Integrity {
        address: ContentAddress,
        actual: String,
    },

    /// Filesystem error.
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("content store configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether the failure is a transient availability problem rather than a
    /// statement about the content itself.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Io { .. })
    }
}
