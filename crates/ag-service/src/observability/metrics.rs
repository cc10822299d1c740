//! Metrics definitions for the auth gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `ag_` prefix for the auth gateway
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `method`: 7 values max (GET, POST, PATCH, DELETE, PUT, HEAD, OPTIONS)
//! - `endpoint`: 4 values (the operational paths plus `/decision`)
//! - `status`: 3 values (success, error, timeout)
//! - `outcome`: 5 values (anonymous, authenticated, renewed, revoked_anonymous, rejected)
//! - `result`: 3 values (hit, miss, error) for revocation lookups

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded. Configures histogram
/// buckets for HTTP request and auth decision latencies. Decision buckets
/// extend to 5s because a decision that triggers renewal carries a full
/// upstream round-trip inside it.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("ag_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("ag_auth_decision".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set auth decision buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `ag_http_requests_total`, `ag_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// This captures ALL HTTP responses including framework-level errors like:
/// - 404 Not Found
/// - 405 Method Not Allowed
/// - 408 Request Timeout (from the timeout layer)
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    // Normalize endpoint to prevent cardinality explosion
    let normalized_endpoint = normalize_endpoint(endpoint);

    // Determine status category for simplified querying
    let status = categorize_status_code(status_code);

    histogram!("ag_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.clone(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("ag_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Normalize endpoint path to prevent label cardinality explosion
///
/// The gateway authenticates arbitrary client paths, so everything that is
/// not an operational endpoint collapses into the `/decision` label.
fn normalize_endpoint(path: &str) -> String {
    match path {
        "/health" => "/health".to_string(),
        "/ready" => "/ready".to_string(),
        "/metrics" => "/metrics".to_string(),
        _ => "/decision".to_string(),
    }
}

// ============================================================================
// Auth Decision Metrics
// ============================================================================

/// Record one pass through the authentication filter.
///
/// Metric: `ag_auth_decisions_total`, `ag_auth_decision_duration_seconds`
/// Labels: `outcome`
///
/// Outcomes: "anonymous", "authenticated", "renewed", "revoked_anonymous",
/// "rejected". The duration covers the whole decision, including the
/// revocation lookup and any renewal round-trip.
pub fn record_auth_decision(outcome: &str, duration: Duration) {
    histogram!("ag_auth_decision_duration_seconds",
        "outcome" => outcome.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("ag_auth_decisions_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

// ============================================================================
// Revocation Store Metrics
// ============================================================================

/// Record a revocation store lookup.
///
/// Metric: `ag_revocation_lookups_total`
/// Labels: `result`
///
/// Results: "hit" (token revoked), "miss" (token not revoked), "error"
/// (store unreachable; the request proceeded unauthenticated).
pub fn record_revocation_lookup(result: &str) {
    counter!("ag_revocation_lookups_total",
        "result" => result.to_string()
    )
    .increment(1);
}

// ============================================================================
// Renewal Metrics
// ============================================================================

/// Record a token renewal attempt.
///
/// Metric: `ag_renewals_total`
/// Labels: `status`
///
/// Status values: "success", "failure"
pub fn record_renewal(status: &str) {
    counter!("ag_renewals_total",
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// Tests
// ============================================================================
