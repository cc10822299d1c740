//! Observability module for the auth gateway.
//!
//! Provides metrics definitions and instrumentation helpers.

pub mod metrics;
