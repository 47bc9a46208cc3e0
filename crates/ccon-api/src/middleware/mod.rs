//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - [`metrics`]: request and error counters exported through the `metrics`
//!   facade.
//!
//! Request tracing is `tower_http::trace::TraceLayer`, applied in
//! [`crate::app`].

pub mod metrics;
