//! # API Route Modules
//!
//! - `sessions`: open, inspect, cancel and close operator sessions.
//! - `donations`: donor deposits into the contract.
//! - `goods`: goods requests, supplier fill offers and their approval.
//! - `invoices`: the approved invoice and its payment.
//! - `cash`: cash requests and their approval.
//! - `accounts`: node accounts, console roles and balance quotes.
//! - `ledger`: the persisted ledger the contract points at.
//!
//! Mutating routes live under `/v1/sessions/{id}/…` and run through
//! [`crate::interaction`]. Reads of current contract state are global.

pub mod accounts;
pub mod cash;
pub mod donations;
pub mod goods;
pub mod invoices;
pub mod ledger;
pub mod sessions;
