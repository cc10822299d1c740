//! HTTP routes for the auth gateway.
//!
//! Defines the Axum router and application state.

use crate::auth::TokenCodec;
use crate::config::Config;
use crate::handlers;
use crate::middleware::{authenticate, http_metrics_middleware, AuthState};
use crate::revocation::RevocationStoreTrait;
use crate::services::RenewalClient;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Token codec bound to the process-wide signing key.
    pub codec: Arc<TokenCodec>,

    /// Revocation store consulted before signature verification.
    pub revocation: Arc<dyn RevocationStoreTrait>,

    /// Client for renewing expired tokens upstream.
    pub renewal: Arc<RenewalClient>,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health` - Liveness probe (simple "OK") - public, unversioned
/// - `/ready` - Readiness probe (reports revocation store health) - public, unversioned
/// - `/metrics` - Prometheus metrics endpoint - public, unversioned
/// - every other path - the decision endpoint, behind the authentication filter
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let auth_state = Arc::new(AuthState {
        codec: state.codec.clone(),
        revocation: state.revocation.clone(),
        renewal: state.renewal.clone(),
    });

    // Operational routes (never authenticated)
    let operational_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .with_state(state);

    // Metrics route with its own state
    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Every remaining path is a decision request. The filter is a plain
    // layer rather than a route_layer because route_layer does not apply
    // to fallbacks.
    let decision_routes = Router::new()
        .fallback(handlers::forward_decision)
        .layer(middleware::from_fn_with_state(auth_state, authenticate));

    // Merge routes and apply global middleware layers
    // Layer order (bottom-to-top execution):
    // 1. TraceLayer - Log request details (innermost)
    // 2. TimeoutLayer - Bound request duration
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    operational_routes
        .merge(metrics_routes)
        .merge(decision_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        // HTTP metrics layer (outermost) - captures ALL responses including
        // framework-level errors like 405 and 408
        .layer(middleware::from_fn(http_metrics_middleware))
}
