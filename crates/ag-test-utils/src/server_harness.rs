//! Test server harness for E2E testing
//!
//! Provides `TestAgServer` for spawning real auth gateway instances in tests.

use crate::token_factory::test_secret_base64url;
use ag_service::auth::{SigningKey, TokenCodec};
use ag_service::config::Config;
use ag_service::observability::metrics::init_metrics_recorder;
use ag_service::revocation::RevocationStoreTrait;
use ag_service::routes::{self, AppState};
use ag_service::services::RenewalClient;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use secrecy::SecretString;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use tokio::task::JoinHandle;

/// Process-wide metrics handle shared by every harness instance.
///
/// The Prometheus recorder installs into a global slot exactly once per
/// process; later spawns reuse the first handle, and if some other
/// component won the race we fall back to a detached recorder so tests
/// still get a working handle.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder()
                .unwrap_or_else(|_| PrometheusBuilder::new().build_recorder().handle())
        })
        .clone()
}

/// Test harness for spawning an auth gateway server in E2E tests.
///
/// The harness skips the secret manager entirely: the token codec is built
/// from the fixed test secret, so tokens minted by `TestTokenBuilder`
/// verify against the spawned server. The revocation store and renewal
/// endpoint are injected so tests control both.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_e2e() -> Result<(), anyhow::Error> {
///     let server = TestAgServer::spawn(
///         Arc::new(MockRevocationStore::empty()),
///         "http://localhost:1/refresh",
///     )
///     .await?;
///
///     let response = reqwest::get(format!("{}/health", server.url())).await?;
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAgServer {
    addr: SocketAddr,
    config: Config,
    _handle: JoinHandle<()>,
}

impl TestAgServer {
    /// Spawn a new test server instance.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    ///
    /// # Arguments
    /// * `revocation` - Revocation store, typically a `MockRevocationStore`
    /// * `refresh_url` - Renewal endpoint, typically a wiremock URL
    ///
    /// # Returns
    /// * `Ok(TestAgServer)` - Running server instance
    /// * `Err(anyhow::Error)` - If server spawn fails
    pub async fn spawn(
        revocation: Arc<dyn RevocationStoreTrait>,
        refresh_url: &str,
    ) -> Result<Self, anyhow::Error> {
        // Build configuration for test environment. JWT_SECRET_URL and
        // REDIS_URL satisfy config validation but are never contacted; the
        // codec and store built below take their place.
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            (
                "JWT_SECRET_URL".to_string(),
                "http://localhost:8089/secret/jwt-signing".to_string(),
            ),
            ("TOKEN_REFRESH_URL".to_string(), refresh_url.to_string()),
            (
                "REDIS_URL".to_string(),
                "redis://localhost:6379/0".to_string(),
            ),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let key = SigningKey::from_base64url(&SecretString::from(test_secret_base64url()))
            .map_err(|e| anyhow::anyhow!("Failed to build test signing key: {}", e))?;
        let codec = Arc::new(TokenCodec::new(key));

        let renewal = Arc::new(
            RenewalClient::new(config.token_refresh_url.clone())
                .map_err(|e| anyhow::anyhow!("Failed to build renewal client: {}", e))?,
        );

        let state = Arc::new(AppState {
            config: config.clone(),
            codec,
            revocation,
            renewal,
        });

        // Build routes using ag-service's real route builder
        let app = routes::build_routes(state, metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            // connect-info service matches what main() serves
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Drop for TestAgServer {
    fn drop(&mut self) {
        // Stop the background server task as soon as the test is done with it
        self._handle.abort();
    }
}
