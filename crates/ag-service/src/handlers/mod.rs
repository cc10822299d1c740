//! HTTP request handlers for the auth gateway.

pub mod forward;
pub mod health;
pub mod metrics;

pub use forward::forward_decision;
pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
