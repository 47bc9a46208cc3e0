//! In-memory content store.
//!
//! Stores blobs in a `HashMap` keyed by SHA-256 address. Intended for tests,
//! simulation mode and single-process demos: nothing survives a restart.
//!
//! The store can be switched offline with [`MemContentStore::set_available`]
//! to exercise `ContentStoreUnavailable` handling in callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use ccon_core::ContentAddress;
use parking_lot::RwLock;

use crate::digest;
use crate::error::StoreError;
use crate::traits::ContentStore;

#[derive(Debug, Default)]
struct Inner {
    blobs: RwLock<HashMap<ContentAddress, Vec<u8>>>,
    offline: AtomicBool,
    publishes: AtomicU64,
    fetches: AtomicU64,
}

/// In-memory content store. Cheap to clone; clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemContentStore {
    inner: Arc<Inner>,
}

impl MemContentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the store online or take it offline. While offline every
    /// operation fails with [`StoreError::Unavailable`].
    pub fn set_available(&self, available: bool) {
        self.inner.offline.store(!available, Ordering::SeqCst);
    }

    /// Number of blobs held.
    pub fn len(&self) -> usize {
        self.inner.blobs.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a blob exists at `address`.
    pub fn contains(&self, address: &ContentAddress) -> bool {
        self.inner.blobs.read().contains_key(address)
    }

    /// Successful publish calls so far.
    pub fn publish_count(&self) -> u64 {
        self.inner.publishes.load(Ordering::SeqCst)
    }

    /// Successful fetch calls so far.
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    fn check_online(&self, operation: &'static str) -> Result<(), StoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                operation,
                reason: "in-memory store is offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemContentStore {
    async fn publish(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError> {
        self.check_online("publish")?;
        let address = digest::address_of(bytes);
        self.inner
            .blobs
            .write()
            .entry(address.clone())
            .or_insert_with(|| bytes.to_vec());
        self.inner.publishes.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(%address, size = bytes.len(), "published blob to memory store");
        Ok(address)
    }

    async fn fetch(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError> {
        self.check_online("fetch")?;
        let bytes = self
            .inner
            .blobs
            .read()
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(address.clone()))?;
        digest::verify(address, &bytes)?;
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(bytes)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
