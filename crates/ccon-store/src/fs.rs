//! # Filesystem Content Store
//!
//! Blobs are stored at `{root}/{sha256}.json`. Writes go to a sibling
//! `.partial` file first and are renamed into place, so a reader never sees
//! a half-written blob. On retrieval the digest is recomputed and verified
//! against the filename; corruption or tampering is detected at read time.
//! Publishing over a corrupt blob rewrites it.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use ccon_core::ContentAddress;

use crate::digest;
use crate::error::StoreError;
use crate::traits::ContentStore;

/// A content store backed by a local directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    /// Create a store rooted at `root`. The directory is created on first publish.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a blob.
    pub fn blob_path(&self, address: &ContentAddress) -> PathBuf {
        self.root.join(format!("{}.json", address.as_str()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn publish(&self, bytes: &[u8]) -> Result<ContentAddress, StoreError> {
        let address = digest::address_of(bytes);
        let path = self.blob_path(&address);

        match tokio::fs::read(&path).await {
            Ok(existing) => match digest::verify(&address, &existing) {
                Ok(()) => {
                    tracing::debug!(%address, "blob already present in fs store");
                    return Ok(address);
                }
                Err(err) => {
                    tracing::warn!(%address, error = %err, "existing blob is corrupt; rewriting");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_error(&path, e)),
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error(&self.root, e))?;

        let partial = path.with_extension("json.partial");
        tokio::fs::write(&partial, bytes)
            .await
            .map_err(|e| io_error(&partial, e))?;
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        tracing::debug!(%address, path = %path.display(), "published blob to fs store");
        Ok(address)
    }

    async fn fetch(&self, address: &ContentAddress) -> Result<Vec<u8>, StoreError> {
        if !digest::is_sha256_address(address) {
            return Err(StoreError::NotFound(address.clone()));
        }
        let path = self.blob_path(address);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(address.clone()))
            }
            Err(e) => return Err(io_error(&path, e)),
        };
        digest::verify(address, &bytes)?;
        Ok(bytes)
    }

    fn backend(&self) -> &'static str {
        "fs"
    }
}
