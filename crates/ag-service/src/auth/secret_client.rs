//! Secret-manager client.
//!
//! Fetches the JWT signing secret and, when configured, the revocation
//! store connection info and password. All fetches happen once at startup
//! and every failure is fatal: the gateway does not start without a
//! verified signing key. The channel is HTTPS; when a PEM identity is
//! configured the client presents it for mutual TLS.

use crate::errors::AgError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Request timeout for signing-secret fetches.
const SECRET_REQUEST_TIMEOUT_SECS: u64 = 3;

/// Request timeout for revocation store info fetches.
const CACHE_INFO_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Connect timeout shared by all secret-manager calls.
const SECRET_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Wire envelope returned by the secret manager: `{"body": {"secret": ...}}`.
#[derive(Deserialize)]
struct SecretEnvelope {
    body: SecretBody,
}

#[derive(Deserialize)]
struct SecretBody {
    secret: String,
}

/// Revocation store connection settings assembled from two secret-manager
/// responses: `host:port:database` plus a password.
#[derive(Debug)]
pub struct RedisSettings {
    host: String,
    port: u16,
    database: i64,
    password: SecretString,
}

impl RedisSettings {
    /// Connection parameters for the redis client. Built from discrete
    /// fields rather than a URL so the password never needs escaping and
    /// never appears in a loggable string.
    pub fn connection_info(&self) -> redis::ConnectionInfo {
        redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: redis::RedisConnectionInfo {
                db: self.database,
                password: Some(self.password.expose_secret().to_string()),
                ..Default::default()
            },
        }
    }
}

/// HTTP client for the secret-management service.
#[derive(Debug)]
pub struct SecretClient {
    http_client: reqwest::Client,
}

impl SecretClient {
    /// Builds the client, presenting a client certificate when a PEM
    /// identity (certificate chain + private key) is configured.
    pub fn new(tls_identity_path: Option<&Path>) -> Result<Self, AgError> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(SECRET_REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(SECRET_CONNECT_TIMEOUT_SECS));

        if let Some(path) = tls_identity_path {
            let pem = std::fs::read(path).map_err(|e| {
                AgError::SecretUnavailable(format!(
                    "failed to read TLS identity {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let identity = reqwest::Identity::from_pem(&pem).map_err(|e| {
                AgError::SecretUnavailable(format!(
                    "invalid TLS identity {}: {}",
                    path.display(),
                    e
                ))
            })?;
            builder = builder.identity(identity);
        }

        let http_client = builder.build().map_err(|e| {
            AgError::SecretUnavailable(format!("failed to build secret-manager client: {}", e))
        })?;

        Ok(Self { http_client })
    }

    /// Fetches one secret value from the given endpoint.
    pub async fn fetch_secret(&self, url: &str) -> Result<SecretString, AgError> {
        self.fetch_with_timeout(url, Duration::from_secs(SECRET_REQUEST_TIMEOUT_SECS))
            .await
    }

    /// Fetches a revocation store credential. Same envelope as
    /// [`fetch_secret`](Self::fetch_secret), with a wider timeout because
    /// these calls gate store connection rather than key verification.
    pub async fn fetch_connection_secret(&self, url: &str) -> Result<SecretString, AgError> {
        self.fetch_with_timeout(url, Duration::from_secs(CACHE_INFO_REQUEST_TIMEOUT_SECS))
            .await
    }

    /// Fetches and assembles the revocation store connection settings.
    pub async fn fetch_cache_settings(
        &self,
        info_url: &str,
        password_url: &str,
    ) -> Result<RedisSettings, AgError> {
        let info = self.fetch_connection_secret(info_url).await?;
        let password = self.fetch_connection_secret(password_url).await?;

        parse_connection_info(info.expose_secret(), password)
    }

    async fn fetch_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<SecretString, AgError> {
        tracing::debug!(target: "ag.auth.secret", url = %url, "fetching secret");

        let response = self
            .http_client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AgError::SecretUnavailable(format!("secret fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgError::SecretUnavailable(format!(
                "secret endpoint returned {}",
                status
            )));
        }

        let envelope: SecretEnvelope = response.json().await.map_err(|e| {
            AgError::SecretUnavailable(format!("secret envelope malformed: {}", e))
        })?;

        if envelope.body.secret.is_empty() {
            return Err(AgError::SecretUnavailable(
                "secret endpoint returned an empty secret".to_string(),
            ));
        }

        Ok(SecretString::from(envelope.body.secret))
    }
}

/// Parses the `host:port:database` connection info string. Exactly three
/// colon-separated parts are required.
fn parse_connection_info(info: &str, password: SecretString) -> Result<RedisSettings, AgError> {
    let parts: Vec<&str> = info.split(':').collect();
    let [host, port, database] = parts.as_slice() else {
        return Err(AgError::SecretUnavailable(format!(
            "revocation store info must be host:port:database, got {} parts",
            parts.len()
        )));
    };

    if host.is_empty() {
        return Err(AgError::SecretUnavailable(
            "revocation store info has an empty host".to_string(),
        ));
    }

    let port: u16 = port.parse().map_err(|e| {
        AgError::SecretUnavailable(format!("invalid revocation store port '{}': {}", port, e))
    })?;

    let database: i64 = database.parse().map_err(|e| {
        AgError::SecretUnavailable(format!(
            "invalid revocation store database '{}': {}",
            database, e
        ))
    })?;

    Ok(RedisSettings {
        host: host.to_string(),
        port,
        database,
        password,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn secret_body(value: &str) -> serde_json::Value {
        serde_json::json!({ "body": { "secret": value } })
    }

    // ==================== fetch_secret ====================

    #[tokio::test]
    async fn test_fetch_secret_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwt-signing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(secret_body("c2VjcmV0")))
            .expect(1)
            .mount(&server)
            .await;

        let client = SecretClient::new(None).unwrap();
        let secret = client
            .fetch_secret(&format!("{}/jwt-signing", server.uri()))
            .await
            .unwrap();

        assert_eq!(secret.expose_secret(), "c2VjcmV0");
    }

    #[tokio::test]
    async fn test_fetch_secret_missing_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwt-signing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"body": {}})))
            .mount(&server)
            .await;

        let client = SecretClient::new(None).unwrap();
        let err = client
            .fetch_secret(&format!("{}/jwt-signing", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(msg) if msg.contains("malformed")));
    }

    #[tokio::test]
    async fn test_fetch_secret_empty_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwt-signing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(secret_body("")))
            .mount(&server)
            .await;

        let client = SecretClient::new(None).unwrap();
        let err = client
            .fetch_secret(&format!("{}/jwt-signing", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(msg) if msg.contains("empty")));
    }

    #[tokio::test]
    async fn test_fetch_secret_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jwt-signing"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = SecretClient::new(None).unwrap();
        let err = client
            .fetch_secret(&format!("{}/jwt-signing", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(msg) if msg.contains("returned")));
    }

    #[tokio::test]
    async fn test_fetch_secret_unreachable() {
        // Take an address that was live and no longer is
        let server = MockServer::start().await;
        let url = format!("{}/jwt-signing", server.uri());
        drop(server);

        let client = SecretClient::new(None).unwrap();
        let err = client.fetch_secret(&url).await.unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(_)));
    }

    // ==================== cache settings ====================

    #[tokio::test]
    async fn test_fetch_connection_secret_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/redis-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(secret_body("hunter2")))
            .expect(1)
            .mount(&server)
            .await;

        let client = SecretClient::new(None).unwrap();
        let secret = client
            .fetch_connection_secret(&format!("{}/redis-password", server.uri()))
            .await
            .unwrap();

        assert_eq!(secret.expose_secret(), "hunter2");
    }

    #[tokio::test]
    async fn test_fetch_cache_settings_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/redis-info"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(secret_body("cache.internal:6380:2")),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/redis-password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(secret_body("hunter2")))
            .mount(&server)
            .await;

        let client = SecretClient::new(None).unwrap();
        let settings = client
            .fetch_cache_settings(
                &format!("{}/redis-info", server.uri()),
                &format!("{}/redis-password", server.uri()),
            )
            .await
            .unwrap();

        let info = settings.connection_info();
        match info.addr {
            redis::ConnectionAddr::Tcp(host, port) => {
                assert_eq!(host, "cache.internal");
                assert_eq!(port, 6380);
            }
            other => panic!("expected TCP address, got {:?}", other),
        }
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_parse_connection_info_rejects_two_parts() {
        let err = parse_connection_info(
            "cache.internal:6380",
            SecretString::from("pw".to_string()),
        )
        .unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(msg) if msg.contains("got 2 parts")));
    }

    #[test]
    fn test_parse_connection_info_rejects_four_parts() {
        let err = parse_connection_info(
            "cache.internal:6380:2:extra",
            SecretString::from("pw".to_string()),
        )
        .unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(msg) if msg.contains("got 4 parts")));
    }

    #[test]
    fn test_parse_connection_info_rejects_bad_port() {
        let err = parse_connection_info(
            "cache.internal:not-a-port:2",
            SecretString::from("pw".to_string()),
        )
        .unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(msg) if msg.contains("port")));
    }

    #[test]
    fn test_parse_connection_info_rejects_empty_host() {
        let err =
            parse_connection_info(":6380:2", SecretString::from("pw".to_string())).unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(msg) if msg.contains("empty host")));
    }

    // ==================== TLS identity ====================

    #[test]
    fn test_new_with_missing_identity_file() {
        let err = SecretClient::new(Some(Path::new("/nonexistent/client-identity.pem")))
            .unwrap_err();

        assert!(
            matches!(err, AgError::SecretUnavailable(msg) if msg.contains("failed to read TLS identity"))
        );
    }
}
