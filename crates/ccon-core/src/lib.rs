//! # ccon-core: Foundational Types for Community Connect
//!
//! Every other crate in the workspace depends on `ccon-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for chain primitives.** `Address`, `TxHash`,
//!    `ContentAddress` and `Wei` all have validated constructors. No bare
//!    strings for identifiers, no bare integers for balances.
//!
//! 2. **One ledger row shape.** [`TransactionReceipt`] serializes to exactly
//!    the six ledger columns (see [`LEDGER_COLUMNS`]). Rows with a missing or
//!    extra column are rejected at deserialization time.
//!
//! 3. **Append-only ledger.** [`LedgerTable`] exposes no removal or mutation
//!    API. The only way to combine tables is [`LedgerTable::concat`], which
//!    keeps the previously persisted rows first.
//!
//! 4. **Canonical snapshot bytes.** Published snapshots flow through
//!    [`CanonicalBytes`], so identical tables always produce identical bytes
//!    and therefore identical content addresses.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ccon-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod amount;
pub mod canonical;
pub mod error;
pub mod identity;
pub mod receipt;

// Re-export primary types for ergonomic imports.
pub use amount::Wei;
pub use canonical::CanonicalBytes;
pub use error::{CanonicalizationError, CconError, LedgerFormatError, ValidationError};
pub use identity::{Address, ContentAddress, TxHash};
pub use receipt::{LedgerTable, TransactionReceipt, LEDGER_COLUMNS};
