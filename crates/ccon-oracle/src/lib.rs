//! # ccon-oracle: Display-Only Lookups
//!
//! Geocoding for request map pins and spot prices for USD balance quotes.
//! Nothing here feeds the ledger: every failure is an [`OracleError`] that
//! callers log and drop, keeping the on-chain interaction that already
//! succeeded.

pub mod config;
pub mod error;
pub mod geocode;
pub mod price;
pub mod quote;

pub use config::OracleConfig;
pub use error::OracleError;
pub use geocode::{Coordinates, Geocoder, MapPin, MapboxGeocoder};
pub use price::{PriceFeed, SpotPriceFeed};
pub use quote::BalanceQuote;
