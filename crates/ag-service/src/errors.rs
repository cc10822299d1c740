//! Auth Gateway error types.
//!
//! All errors map to appropriate HTTP status codes via the `IntoResponse` impl.
//! Error messages returned to clients are intentionally generic to avoid
//! leaking token or infrastructure details. Actual errors are logged
//! server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Auth Gateway error type.
///
/// Maps to appropriate HTTP status codes:
/// - SecretUnavailable, RevocationUnavailable: 503 Service Unavailable
///   (SecretUnavailable is fatal at startup and should never reach a client)
/// - SignatureInvalid, TokenMalformed, TokenExpiredUnrenewable: 401 Unauthorized
/// - Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum AgError {
    #[error("Signing secret unavailable: {0}")]
    SecretUnavailable(String),

    #[error("Revocation store unavailable: {0}")]
    RevocationUnavailable(String),

    #[error("Token signature verification failed")]
    SignatureInvalid,

    #[error("Malformed bearer token: {0}")]
    TokenMalformed(String),

    #[error("Token expired and renewal failed: {0}")]
    TokenExpiredUnrenewable(String),

    #[error("Internal server error")]
    Internal,
}

impl AgError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            AgError::SecretUnavailable(_) | AgError::RevocationUnavailable(_) => 503,
            AgError::SignatureInvalid
            | AgError::TokenMalformed(_)
            | AgError::TokenExpiredUnrenewable(_) => 401,
            AgError::Internal => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for AgError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AgError::SecretUnavailable(err) => {
                // Log actual error server-side, return generic message to client
                tracing::error!(target: "ag.errors", error = %err, "Signing secret unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            AgError::RevocationUnavailable(err) => {
                // The filter normally fails open on revocation outages; this
                // path only renders if the error is surfaced deliberately.
                tracing::error!(target: "ag.errors", error = %err, "Revocation store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Service temporarily unavailable".to_string(),
                )
            }
            AgError::SignatureInvalid => (
                StatusCode::UNAUTHORIZED,
                "SIGNATURE_INVALID",
                "The access token is invalid".to_string(),
            ),
            AgError::TokenMalformed(reason) => {
                // Parse detail stays server-side; clients get a uniform message
                tracing::debug!(target: "ag.errors", reason = %reason, "Malformed bearer token");
                (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_MALFORMED",
                    "The access token is invalid".to_string(),
                )
            }
            AgError::TokenExpiredUnrenewable(reason) => {
                tracing::debug!(target: "ag.errors", reason = %reason, "Token expired and renewal failed");
                (
                    StatusCode::UNAUTHORIZED,
                    "TOKEN_EXPIRED",
                    "The access token is expired and could not be renewed".to_string(),
                )
            }
            AgError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) =
                "Bearer realm=\"auth-gateway\", error=\"invalid_token\"".parse()
            {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}
