//! # AG Test Utilities
//!
//! Shared test utilities for the Auth Gateway (AG) service.
//!
//! This crate provides:
//! - Deterministic token fixtures (fixed signing secret, `TestTokenBuilder`)
//! - Server test harness (`TestAgServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ag_test_utils::*;
//! use ag_service::revocation::mock::MockRevocationStore;
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestAgServer::spawn(
//!         Arc::new(MockRevocationStore::empty()),
//!         "http://localhost:1/refresh",
//!     )
//!     .await?;
//!
//!     let token = TestTokenBuilder::new()
//!         .for_subject("alice")
//!         .with_authorities(&["ROLE_USER"])
//!         .build();
//!
//!     let client = reqwest::Client::new();
//!     let response = client
//!         .get(format!("{}/any/path", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 204);
//!     Ok(())
//! }
//! ```

pub mod server_harness;
pub mod token_factory;

// Re-export commonly used items
pub use server_harness::*;
pub use token_factory::*;
