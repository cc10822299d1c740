//! Token renewal client.
//!
//! When a structurally valid token is past expiry, the gateway asks the
//! external refresh endpoint for a replacement, presenting the expired
//! token as the bearer credential. The refresh endpoint decides renewal
//! eligibility on its own; every failure here (transport, refusal,
//! malformed response) collapses into one rejection shape for the caller.

use crate::errors::AgError;
use crate::observability::metrics::record_renewal;
use std::time::Duration;

/// Request timeout for renewal calls.
const RENEWAL_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Connect timeout for renewal calls.
const RENEWAL_CONNECT_TIMEOUT_SECS: u64 = 3;

const BEARER_PREFIX: &str = "Bearer ";

/// HTTP client for the external token refresh endpoint.
pub struct RenewalClient {
    http_client: reqwest::Client,
    refresh_url: String,
}

impl RenewalClient {
    pub fn new(refresh_url: String) -> Result<Self, AgError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RENEWAL_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(RENEWAL_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| {
                tracing::error!(
                    target: "ag.services.renewal",
                    error = %e,
                    "Failed to build HTTP client"
                );
                AgError::Internal
            })?;

        Ok(Self {
            http_client,
            refresh_url,
        })
    }

    /// Requests a replacement for an expired token.
    ///
    /// On success the replacement arrives in the response `Authorization`
    /// header; the returned string has the `Bearer ` prefix stripped.
    pub async fn renew(&self, expired_token: &str) -> Result<String, AgError> {
        let result = self.request_renewal(expired_token).await;
        match &result {
            Ok(_) => record_renewal("success"),
            Err(_) => record_renewal("failure"),
        }
        result
    }

    async fn request_renewal(&self, expired_token: &str) -> Result<String, AgError> {
        let response = self
            .http_client
            .get(&self.refresh_url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{}{}", BEARER_PREFIX, expired_token),
            )
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(target: "ag.services.renewal", error = %e, "Renewal request failed");
                AgError::TokenExpiredUnrenewable(format!("renewal endpoint unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(target: "ag.services.renewal", status = %status, "Renewal refused");
            return Err(AgError::TokenExpiredUnrenewable(format!(
                "renewal endpoint returned {}",
                status
            )));
        }

        let header_value = response
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .ok_or_else(|| {
                AgError::TokenExpiredUnrenewable(
                    "renewal response carried no Authorization header".to_string(),
                )
            })?;

        let value = header_value.to_str().map_err(|_| {
            AgError::TokenExpiredUnrenewable(
                "renewal response Authorization header is not valid ASCII".to_string(),
            )
        })?;

        let token = value.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
            AgError::TokenExpiredUnrenewable(
                "renewal response Authorization header is not a bearer credential".to_string(),
            )
        })?;

        if token.is_empty() {
            return Err(AgError::TokenExpiredUnrenewable(
                "renewal response carried an empty token".to_string(),
            ));
        }

        tracing::debug!(target: "ag.services.renewal", "token renewed");
        Ok(token.to_string())
    }
}
