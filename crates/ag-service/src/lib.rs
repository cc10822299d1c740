//! Auth Gateway (AG) Service Library
//!
//! This library provides the authentication stage of a reverse-proxy
//! pipeline. Each request's Bearer token is classified exactly once: valid
//! tokens stamp identity headers onto the forwarded request, expired tokens
//! are renewed upstream, revoked tokens are forwarded without identity, and
//! tokens that cannot be trusted are rejected.
//!
//! # Modules
//!
//! - `auth` - Claims, token codec, and secret-manager client
//! - `config` - Service configuration
//! - `errors` - Error types
//! - `handlers` - HTTP request handlers
//! - `middleware` - Authentication filter and HTTP metrics middleware
//! - `observability` - Metrics definitions
//! - `revocation` - Revocation store client
//! - `routes` - Router and application state
//! - `services` - Upstream service clients

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod revocation;
pub mod routes;
pub mod services;
