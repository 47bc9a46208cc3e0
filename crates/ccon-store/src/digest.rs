//! # SHA-256 Content Addressing
//!
//! Address derivation shared by the local backends: the address of a blob
//! is the lowercase hex SHA-256 of its bytes.

use ccon_core::ContentAddress;
use sha2::{Digest, Sha256};

use crate::error::StoreError;

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Content address for `bytes` under SHA-256 addressing.
pub fn address_of(bytes: &[u8]) -> ContentAddress {
    let hash = Sha256::digest(bytes);
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hash);
    ContentAddress::from_sha256(digest)
}

/// Check that `bytes` hash to `address`.
pub fn verify(address: &ContentAddress, bytes: &[u8]) -> Result<(), StoreError> {
    let actual = sha256_hex(bytes);
    if actual.eq_ignore_ascii_case(address.as_str()) {
        Ok(())
    } else {
        Err(StoreError::Integrity {
            address: address.clone(),
            actual,
        })
    }
}

/// Whether `address` has the shape of a SHA-256 address. Used by the
/// filesystem backend to refuse path-like addresses.
pub fn is_sha256_address(address: &ContentAddress) -> bool {
    let s = address.as_str();
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}
