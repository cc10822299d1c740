//! HTTP metrics middleware for capturing all request/response metrics
//!
//! This middleware captures metrics for ALL HTTP responses including
//! framework-level errors that occur before handlers run:
//! - 405 Method Not Allowed (wrong verb on an operational endpoint)
//! - 408 Request Timeout (from the timeout layer)
//!
//! Applied as the outermost layer so the recorded duration includes the
//! auth decision and every inner layer.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Records method, normalized path, status code, and duration for every
/// response that leaves the gateway.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    // Method and path are captured before the request is consumed
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}
