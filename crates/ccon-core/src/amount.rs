//! # Wei Amounts
//!
//! Balances and transfer amounts in the smallest currency unit.
//!
//! Contract balances routinely exceed both the 2^53 range of JSON numbers
//! and `u64`, so [`Wei`] is a `u128` that serializes as a decimal string.
//! For convenience it deserializes from either a string or a JSON integer.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// Number of wei in one ether.
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// An amount of wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Wei(pub u128);

impl Wei {
    /// Zero wei.
    pub const ZERO: Wei = Wei(0);

    /// Build from whole ether.
    pub fn from_ether(ether: u64) -> Self {
        Self(u128::from(ether) * WEI_PER_ETHER)
    }

    /// The raw amount.
    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// Checked addition.
    pub fn checked_add(self, rhs: Wei) -> Option<Wei> {
        self.0.checked_add(rhs.0).map(Wei)
    }

    /// Checked subtraction.
    pub fn checked_sub(self, rhs: Wei) -> Option<Wei> {
        self.0.checked_sub(rhs.0).map(Wei)
    }
}

impl std::fmt::Display for Wei {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Wei {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Wei)
            .map_err(|_| ValidationError::InvalidAmount(s.to_string()))
    }
}

impl From<u64> for Wei {
    fn from(value: u64) -> Self {
        Self(u128::from(value))
    }
}

impl Serialize for Wei {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Wei {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WeiVisitor)
    }
}

struct WeiVisitor;

impl<'de> Visitor<'de> for WeiVisitor {
    type Value = Wei;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a non-negative integer amount of wei, as a string or integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Wei, E> {
        Ok(Wei::from(v))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Wei, E> {
        Ok(Wei(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Wei, E> {
        u128::try_from(v)
            .map(Wei)
            .map_err(|_| E::custom(ValidationError::InvalidAmount(v.to_string())))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Wei, E> {
        v.parse().map_err(E::custom)
    }
}
