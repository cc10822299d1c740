//! Middleware for the auth gateway.
//!
//! This module contains HTTP middleware layers for the AG service.
//!
//! # Components
//!
//! - `auth` - Authentication filter applied to every decision request
//! - `http_metrics` - HTTP request metrics middleware

pub mod auth;
pub mod http_metrics;

pub use auth::{authenticate, AuthState, AUTH_AUTHORITIES_HEADER, AUTH_ID_HEADER};
pub use http_metrics::http_metrics_middleware;
