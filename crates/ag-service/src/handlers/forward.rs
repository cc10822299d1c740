//! Terminal handler for decision requests.
//!
//! The gateway's work ends once the authentication filter has classified a
//! request. In deployment, the decision route sits behind a forward-auth
//! reverse proxy: the proxy sends each inbound request here, reads the
//! identity headers off our response, and copies them onto the request it
//! proxies upstream. Mirroring the request headers back is that contract;
//! 204 keeps the exchange body-free.

use crate::middleware::{AUTH_AUTHORITIES_HEADER, AUTH_ID_HEADER};
use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Decision endpoint handler for all non-operational paths.
///
/// Returns 204 No Content. Identity headers set by the authentication
/// filter are mirrored onto the response for the fronting proxy to read;
/// anonymous and renewed requests mirror nothing.
pub async fn forward_decision(req: Request) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    for name in [AUTH_ID_HEADER, AUTH_AUTHORITIES_HEADER] {
        if let Some(value) = req.headers().get(name) {
            response.headers_mut().insert(name, value.clone());
        }
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use axum::Router;
    use tower::ServiceExt;

    fn test_app() -> Router {
        Router::new().fallback(forward_decision)
    }

    #[tokio::test]
    async fn test_forward_without_identity() {
        let request = HttpRequest::builder()
            .method("GET")
            .uri("/any/path/at/all")
            .body(Body::empty())
            .expect("request builder should succeed");

        let response = test_app()
            .oneshot(request)
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.headers().get(AUTH_ID_HEADER).is_none());
        assert!(response.headers().get(AUTH_AUTHORITIES_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_forward_mirrors_identity_headers() {
        // Simulates a request the authentication filter has already stamped
        let request = HttpRequest::builder()
            .method("GET")
            .uri("/api/orders")
            .header(AUTH_ID_HEADER, "alice")
            .header(AUTH_AUTHORITIES_HEADER, r#"["ROLE_USER"]"#)
            .body(Body::empty())
            .expect("request builder should succeed");

        let response = test_app()
            .oneshot(request)
            .await
            .expect("request should succeed");

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get(AUTH_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("alice")
        );
        assert_eq!(
            response
                .headers()
                .get(AUTH_AUTHORITIES_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some(r#"["ROLE_USER"]"#)
        );
    }
}
