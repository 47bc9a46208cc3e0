//! # Canonical Serialization: JCS-Compatible Byte Production
//!
//! `CanonicalBytes` is the only construction path for bytes that get
//! published to the content store.
//!
//! ## Invariant
//!
//! The inner field is private; the only constructor is
//! [`CanonicalBytes::new()`], which rejects floats and serializes with
//! `serde_jcs` (RFC 8785: sorted keys, compact separators). Two equal ledger
//! tables therefore always produce the same bytes, and a content-addressed
//! store assigns them the same address. Re-publishing an unchanged snapshot
//! is a no-op on the store side.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::FloatRejected` if the value contains a
    /// non-integer number, `SerializationFailed` if serialization fails.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let bytes = serde_jcs::to_vec(&value)?;
        Ok(Self(bytes))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the owned byte vector.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    /// Length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Ok(())
            } else {
                Err(CanonicalizationError::FloatRejected(
                    n.as_f64().unwrap_or(f64::NAN),
                ))
            }
        }
        Value::Array(items) => items.iter().try_for_each(reject_floats),
        Value::Object(map) => map.values().try_for_each(reject_floats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_sorted_and_compact() {
        let cb = CanonicalBytes::new(&json!({"b": 1, "a": [2, 3]})).unwrap();
        assert_eq!(cb.as_bytes(), br#"{"a":[2,3],"b":1}"#);
    }

    #[test]
    fn floats_are_rejected_at_any_depth() {
        let err = CanonicalBytes::new(&json!({"rows": [{"Gas": 1.5}]})).unwrap_err();
        assert!(matches!(err, CanonicalizationError::FloatRejected(_)));
    }

    #[test]
    fn equal_values_produce_equal_bytes() {
        let a = CanonicalBytes::new(&json!({"x": "1", "y": 2})).unwrap();
        let b = CanonicalBytes::new(&json!({"y": 2, "x": "1"})).unwrap();
        assert_eq!(a, b);
    }
}
