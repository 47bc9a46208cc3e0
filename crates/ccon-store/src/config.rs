//! Content store configuration.
//!
//! Selects and configures a backend from environment variables. Defaults to
//! the in-memory backend so a bare `ccon-api` starts without external
//! services.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::error::StoreError;
use crate::fs::FsContentStore;
use crate::ipfs::IpfsContentStore;
use crate::mem::MemContentStore;
use crate::traits::ContentStore;

/// Which backend to build.
#[derive(Clone)]
pub enum StoreBackend {
    /// Process memory.
    Memory,
    /// Local directory.
    Fs { root: PathBuf },
    /// Kubo-compatible RPC endpoint.
    Ipfs {
        api_url: Url,
        token: Option<Zeroizing<String>>,
        timeout_secs: u64,
    },
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::Fs { root } => f.debug_struct("Fs").field("root", root).finish(),
            Self::Ipfs {
                api_url,
                token,
                timeout_secs,
            } => f
                .debug_struct("Ipfs")
                .field("api_url", api_url)
                .field("token", &token.as_ref().map(|_| "[REDACTED]"))
                .field("timeout_secs", timeout_secs)
                .finish(),
        }
    }
}

/// Content store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CCON_STORE`: `memory` (default), `fs` or `ipfs`
    /// - `CCON_STORE_DIR`: root for `fs` (default: `./data/ledger`)
    /// - `CCON_IPFS_API_URL`: RPC endpoint for `ipfs` (default: `http://127.0.0.1:5001`)
    /// - `CCON_IPFS_TOKEN`: optional bearer token for `ipfs`
    /// - `CCON_IPFS_TIMEOUT_SECS`: request timeout for `ipfs` (default: 30)
    pub fn from_env() -> Result<Self, StoreError> {
        let kind = std::env::var("CCON_STORE").unwrap_or_else(|_| "memory".to_string());
        let backend = match kind.to_ascii_lowercase().as_str() {
            "memory" | "mem" => StoreBackend::Memory,
            "fs" | "file" => StoreBackend::Fs {
                root: std::env::var("CCON_STORE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./data/ledger")),
            },
            "ipfs" => {
                let raw = std::env::var("CCON_IPFS_API_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:5001".to_string());
                let api_url = Url::parse(&raw)
                    .map_err(|e| StoreError::Config(format!("invalid CCON_IPFS_API_URL: {e}")))?;
                StoreBackend::Ipfs {
                    api_url,
                    token: std::env::var("CCON_IPFS_TOKEN").ok().map(Zeroizing::new),
                    timeout_secs: std::env::var("CCON_IPFS_TIMEOUT_SECS")
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(30),
                }
            }
            other => {
                return Err(StoreError::Config(format!(
                    "unknown CCON_STORE backend {other:?} (expected memory, fs or ipfs)"
                )))
            }
        };
        Ok(Self { backend })
    }

    /// In-memory configuration.
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
        }
    }

    /// Build the configured backend.
    pub fn build(&self) -> Result<Arc<dyn ContentStore>, StoreError> {
        let store: Arc<dyn ContentStore> = match &self.backend {
            StoreBackend::Memory => Arc::new(MemContentStore::new()),
            StoreBackend::Fs { root } => Arc::new(FsContentStore::new(root.clone())),
            StoreBackend::Ipfs {
                api_url,
                token,
                timeout_secs,
            } => Arc::new(IpfsContentStore::new(
                api_url.clone(),
                token.as_ref(),
                Duration::from_secs(*timeout_secs),
            )?),
        };
        tracing::info!(backend = store.backend(), "content store configured");
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_config_builds_memory_backend() {
        let store = StoreConfig::memory().build().unwrap();
        assert_eq!(store.backend(), "memory");
    }

    #[test]
    fn debug_redacts_ipfs_token() {
        let backend = StoreBackend::Ipfs {
            api_url: Url::parse("http://127.0.0.1:5001").unwrap(),
            token: Some(Zeroizing::new("secret-token".to_string())),
            timeout_secs: 5,
        };
        let rendered = format!("{backend:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("secret-token"));
    }

    #[test]
    fn fs_config_builds_fs_backend() {
        let config = StoreConfig {
            backend: StoreBackend::Fs {
                root: PathBuf::from("/tmp/ccon-test"),
            },
        };
        assert_eq!(config.build().unwrap().backend(), "fs");
    }
}
