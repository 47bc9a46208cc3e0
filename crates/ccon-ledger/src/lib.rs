//! # ccon-ledger: Receipt Accumulation and Ledger Mirroring
//!
//! The local core of the console. Each confirmed contract call becomes one
//! row in the session's ledger ([`ReceiptAccumulator`], owned by a
//! [`LedgerSession`]). The [`LedgerMirror`] appends those rows to the ledger
//! persisted in the content store and records the new snapshot's address on
//! the contract.
//!
//! ## Control Flow
//!
//! ```text
//! gateway call ─► Transactor ─► LedgerSession ─► LedgerMirror ─► ContentStore
//!                 (confirm,       (append row)     (fetch, merge,     + pointer write
//!                  balance, block)                  publish)            on the contract
//! ```
//!
//! ## Metrics
//!
//! Counters emitted through the `metrics` facade:
//! - `ccon_ledger_receipts_accumulated_total`
//! - `ccon_ledger_mirror_updates_total`
//! - `ccon_ledger_mirror_rows_total`
//! - `ccon_ledger_mirror_failures_total{stage}`

pub mod accumulator;
pub mod error;
pub mod mirror;
pub mod session;
pub mod transactor;

pub use accumulator::ReceiptAccumulator;
pub use error::MirrorError;
pub use mirror::{LedgerMirror, MirrorOutcome, MirrorPolicy, PersistedLedger};
pub use session::LedgerSession;
pub use transactor::Transactor;
