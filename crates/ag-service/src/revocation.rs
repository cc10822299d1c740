//! Revocation store.
//!
//! Tokens invalidated before natural expiry (logout) live in a shared
//! Redis cache keyed by the raw token string, with the remaining token
//! validity as TTL so entries expire on their own. The external logout
//! flow writes entries; the gateway's request path only reads them. A
//! store outage is reported truthfully here and handled fail-open by the
//! authentication filter.

use crate::errors::AgError;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

/// Response timeout for store operations.
const RESPONSE_TIMEOUT_SECS: u64 = 5;

/// Connect timeout for the initial connection.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Trait for revocation store operations (enables mocking).
#[async_trait]
pub trait RevocationStoreTrait: Send + Sync {
    /// Whether this exact token string has been revoked. Any stored value
    /// counts as revoked.
    async fn is_revoked(&self, token: &str) -> Result<bool, AgError>;

    /// Records a token as revoked for `ttl`.
    ///
    /// Invoked by the logout flow rather than by the request path; it
    /// lives on the trait so deployments and tests share one contract.
    async fn mark_revoked(&self, token: &str, marker: &str, ttl: Duration)
        -> Result<(), AgError>;
}

/// Redis-backed revocation store.
///
/// Holds one multiplexed connection; each operation clones it, which is
/// cheap and safe under concurrent request tasks.
pub struct RedisRevocationStore {
    connection: MultiplexedConnection,
}

impl RedisRevocationStore {
    /// Connects to the store. Connection parameters may carry credentials
    /// and are never logged.
    pub async fn connect(info: redis::ConnectionInfo) -> Result<Self, AgError> {
        let client = redis::Client::open(info).map_err(|e| {
            tracing::error!(
                target: "ag.revocation",
                error = %e,
                "invalid revocation store parameters"
            );
            AgError::RevocationUnavailable(format!("invalid store parameters: {}", e))
        })?;

        let connection = client
            .get_multiplexed_async_connection_with_timeouts(
                Duration::from_secs(RESPONSE_TIMEOUT_SECS),
                Duration::from_secs(CONNECT_TIMEOUT_SECS),
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    target: "ag.revocation",
                    error = %e,
                    "failed to connect to revocation store"
                );
                AgError::RevocationUnavailable(format!("connect failed: {}", e))
            })?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl RevocationStoreTrait for RedisRevocationStore {
    async fn is_revoked(&self, token: &str) -> Result<bool, AgError> {
        let mut conn = self.connection.clone();
        let marker: Option<String> = conn.get(token).await.map_err(|e| {
            tracing::error!(target: "ag.revocation", error = %e, "revocation lookup failed");
            AgError::RevocationUnavailable(format!("lookup failed: {}", e))
        })?;

        Ok(marker.is_some())
    }

    async fn mark_revoked(
        &self,
        token: &str,
        marker: &str,
        ttl: Duration,
    ) -> Result<(), AgError> {
        let mut conn = self.connection.clone();
        // The server rejects EX 0; clamp to one second
        let ttl_seconds = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(token, marker, ttl_seconds)
            .await
            .map_err(|e| {
                tracing::error!(target: "ag.revocation", error = %e, "revocation write failed");
                AgError::RevocationUnavailable(format!("write failed: {}", e))
            })?;

        tracing::debug!(target: "ag.revocation", ttl_seconds, "marked token revoked");
        Ok(())
    }
}

/// Mock revocation store module for testing.
///
/// This module provides an in-memory implementation for use in unit and
/// integration tests, including simulated outages.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory revocation store for testing.
    pub struct MockRevocationStore {
        /// Revoked tokens mapped to (marker, ttl).
        entries: Mutex<HashMap<String, (String, Duration)>>,
        /// Number of lookups made.
        lookup_count: AtomicUsize,
        /// Whether lookups return errors (simulated outage).
        fail_lookups: bool,
    }

    impl MockRevocationStore {
        /// Create a mock with no revoked tokens.
        pub fn empty() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                lookup_count: AtomicUsize::new(0),
                fail_lookups: false,
            }
        }

        /// Create a mock with the given tokens already revoked.
        pub fn with_revoked(tokens: &[&str]) -> Self {
            let entries = tokens
                .iter()
                .map(|token| {
                    (
                        (*token).to_string(),
                        ("logged-out".to_string(), Duration::from_secs(3600)),
                    )
                })
                .collect();

            Self {
                entries: Mutex::new(entries),
                lookup_count: AtomicUsize::new(0),
                fail_lookups: false,
            }
        }

        /// Create a mock whose lookups fail.
        pub fn failing() -> Self {
            Self {
                entries: Mutex::new(HashMap::new()),
                lookup_count: AtomicUsize::new(0),
                fail_lookups: true,
            }
        }

        /// Get the number of lookups made.
        pub fn lookup_count(&self) -> usize {
            self.lookup_count.load(Ordering::SeqCst)
        }

        /// Marker stored for a token, if any.
        pub fn marker_for(&self, token: &str) -> Option<String> {
            self.entries
                .lock()
                .ok()
                .and_then(|entries| entries.get(token).map(|(marker, _)| marker.clone()))
        }

        /// TTL stored for a token, if any.
        pub fn ttl_for(&self, token: &str) -> Option<Duration> {
            self.entries
                .lock()
                .ok()
                .and_then(|entries| entries.get(token).map(|(_, ttl)| *ttl))
        }
    }

    #[async_trait]
    impl RevocationStoreTrait for MockRevocationStore {
        async fn is_revoked(&self, token: &str) -> Result<bool, AgError> {
            self.lookup_count.fetch_add(1, Ordering::SeqCst);

            if self.fail_lookups {
                return Err(AgError::RevocationUnavailable(
                    "Mock revocation store error".to_string(),
                ));
            }

            let entries = self.entries.lock().map_err(|_| {
                AgError::RevocationUnavailable("mock store lock poisoned".to_string())
            })?;
            Ok(entries.contains_key(token))
        }

        async fn mark_revoked(
            &self,
            token: &str,
            marker: &str,
            ttl: Duration,
        ) -> Result<(), AgError> {
            let mut entries = self.entries.lock().map_err(|_| {
                AgError::RevocationUnavailable("mock store lock poisoned".to_string())
            })?;
            entries.insert(token.to_string(), (marker.to_string(), ttl));
            Ok(())
        }
    }

}
