//! Health check handlers.
//!
//! Provides health check endpoints for Kubernetes liveness and readiness probes.
//!
//! - `/health`: Liveness probe - returns OK if the process is running
//! - `/ready`: Readiness probe - reports revocation store reachability

use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Lookup key used to probe the revocation store.
///
/// Not a real token; the colons keep it outside the token keyspace.
const READINESS_PROBE_KEY: &str = "ag:readiness:probe";

/// Readiness probe response body.
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    /// Overall readiness, always "ready" while the process serves traffic.
    pub status: &'static str,
    /// Revocation store reachability: "healthy" or "degraded".
    pub revocation_store: &'static str,
}

/// Liveness probe handler.
///
/// Returns a simple "OK" response to indicate the process is running.
/// Does NOT check any dependencies - failure means the process is hung/deadlocked.
///
/// Kubernetes will kill and restart the pod if this fails.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Always returns 200: the only runtime dependency is the revocation store,
/// and decisions fail open when it is down, so an outage degrades the
/// service rather than stopping it. The store's reachability is still
/// probed and reported in the body for operators and alerting.
#[tracing::instrument(skip_all, name = "ag.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let revocation_store = match state.revocation.is_revoked(READINESS_PROBE_KEY).await {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::warn!("Readiness probe: revocation store unavailable: {}", e);
            "degraded"
        }
    };

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            revocation_store,
        }),
    )
}
