//! # ccon-store: Content-Addressed Storage
//!
//! Storage for serialized ledger snapshots, addressed by their content.
//! Publishing returns a [`ContentAddress`](ccon_core::ContentAddress);
//! publishing different bytes yields a different address, and published
//! content is never modified.
//!
//! ## Backends
//!
//! - [`MemContentStore`]: process memory, SHA-256 addressing, fault
//!   injection for tests.
//! - [`FsContentStore`]: `{root}/{sha256}.json` on the local filesystem.
//! - [`IpfsContentStore`]: any Kubo-compatible RPC endpoint.
//!
//! ## Integrity Invariant
//!
//! The SHA-256 backends re-hash content on every fetch and refuse to return
//! bytes that do not match the requested address.
//!
//! All network operations are one-shot. A failure surfaces immediately as
//! [`StoreError::Unavailable`]; retry policy belongs to the caller.

pub mod config;
pub mod conformance;
pub mod digest;
pub mod error;
pub mod fs;
pub mod ipfs;
pub mod mem;
pub mod traits;

pub use config::{StoreBackend, StoreConfig};
pub use error::StoreError;
pub use fs::FsContentStore;
pub use ipfs::IpfsContentStore;
pub use mem::MemContentStore;
pub use traits::ContentStore;
