//! Core trait for content store backends.

use async_trait::async_trait;
use ccon_core::ContentAddress;

use crate::error::StoreError;

/// A content-addressed blob store.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc` across request handlers. The trait is object-safe.
///
/// # Contract
///
/// - `fetch(publish(b)) == b` for every byte string `b`.
/// - Publishing the same bytes twice yields the same address.
/// - Published content is immutable.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `bytes` and return their content address.
    async fn publish(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError>;

    /// Retrieve the bytes stored at `address`.
    async fn fetch(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError>;

    /// Short backend name for logs (`memory`, `fs`, `ipfs`).
    fn backend(&self) -> &'static str;
}
