//! Clients for external collaborator services.
//!
//! # Components
//!
//! - `renewal_client` - HTTP client for the external token refresh endpoint

pub mod renewal_client;

pub use renewal_client::RenewalClient;
