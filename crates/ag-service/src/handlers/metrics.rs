//! Prometheus metrics endpoint handler.

use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;

/// Render the current metrics in Prometheus text exposition format.
///
/// The handle is the route's own state; it is installed once at startup by
/// `init_metrics_recorder` and rendering it is cheap enough to serve
/// unauthenticated scrapes directly.
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
