//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types shared by every crate in the workspace. All
//! errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Validation errors name the offending value and the expected shape.
//! - Ledger format errors are data errors: they surface when a persisted
//!   snapshot is read back, never when a receipt is accumulated.

use thiserror::Error;

/// Top-level error type for Community Connect core operations.
#[derive(Error, Debug)]
pub enum CconError {
    /// A domain value failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A serialized ledger snapshot could not be read.
    #[error("ledger format error: {0}")]
    LedgerFormat(#[from] LedgerFormatError),
}

/// A domain value did not have the expected shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Account or contract address is not `0x` followed by 40 hex characters.
    #[error("invalid address {0:?}: expected 0x followed by 40 hex characters")]
    InvalidAddress(String),

    /// Transaction hash is not `0x` followed by 64 hex characters.
    #[error("invalid transaction hash {0:?}: expected 0x followed by 64 hex characters")]
    InvalidTxHash(String),

    /// Content address was empty or contained whitespace.
    #[error("invalid content address {0:?}: must be non-empty with no whitespace")]
    InvalidContentAddress(String),

    /// Product type is not one of `Food`, `Supplies` or `Ride`.
    #[error("invalid product type {0:?}: expected Food, Supplies or Ride")]
    InvalidProductType(String),

    /// Amount was not a non-negative integer in the smallest currency unit.
    #[error("invalid amount {0:?}: expected a non-negative integer number of wei")]
    InvalidAmount(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts must be strings or integers.
    #[error("float values are not permitted in canonical representations; use string or integer: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// A persisted ledger snapshot could not be decoded.
#[derive(Error, Debug)]
pub enum LedgerFormatError {
    /// Bytes were not a JSON array of ledger rows with exactly the ledger columns.
    #[error("malformed ledger snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Canonical serialization of the snapshot failed.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),
}
