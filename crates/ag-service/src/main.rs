//! Auth Gateway
//!
//! Entry point for the token-authentication gateway.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Fetch the JWT signing secret from the secret manager (fatal on failure)
//! 4. Connect to the revocation store
//! 5. Build the renewal client and router
//! 6. Serve until SIGTERM/SIGINT, then drain

use ag_service::auth::{SecretClient, SigningKey, TokenCodec};
use ag_service::config::{Config, ConfigError};
use ag_service::observability::metrics::init_metrics_recorder;
use ag_service::revocation::RedisRevocationStore;
use ag_service::routes::{build_routes, AppState};
use ag_service::services::RenewalClient;
use redis::IntoConnectionInfo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ag_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Auth Gateway");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        jwt_secret_url = %config.jwt_secret_url,
        token_refresh_url = %config.token_refresh_url,
        drain_seconds = config.drain_seconds,
        "Configuration loaded successfully"
    );

    // Initialize Prometheus metrics recorder
    // This must happen before any metrics are recorded
    info!("Initializing Prometheus metrics recorder...");
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to install Prometheus metrics recorder: {}", e);
        e
    })?;
    info!("Prometheus metrics recorder initialized");

    // Secret-manager client, with mutual TLS when an identity bundle is
    // configured
    let secret_client = SecretClient::new(config.tls_identity_path.as_deref()).map_err(|e| {
        error!("Failed to build secret-manager client: {}", e);
        e
    })?;

    // The signing secret is fetched once per process; without it the gateway
    // cannot verify anything, so failure here is fatal.
    info!("Fetching JWT signing secret...");
    let secret = secret_client
        .fetch_secret(&config.jwt_secret_url)
        .await
        .map_err(|e| {
            error!("Failed to fetch JWT signing secret: {}", e);
            e
        })?;

    let signing_key = SigningKey::from_base64url(&secret).map_err(|e| {
        error!("JWT signing secret is unusable: {}", e);
        e
    })?;
    let codec = Arc::new(TokenCodec::new(signing_key));
    info!("Signing key loaded");

    // Revocation store. A bad address should fail the deploy, so connect
    // eagerly; outages after this point fail open in the filter.
    info!("Connecting to revocation store...");
    let connection_info = if let Some(url) = &config.redis_url {
        url.as_str().into_connection_info().map_err(|e| {
            error!("Invalid REDIS_URL: {}", e);
            e
        })?
    } else if let Some((info_url, password_url)) = config
        .redis_info_url
        .as_deref()
        .zip(config.redis_password_url.as_deref())
    {
        secret_client
            .fetch_cache_settings(info_url, password_url)
            .await
            .map_err(|e| {
                error!("Failed to fetch revocation store settings: {}", e);
                e
            })?
            .connection_info()
    } else {
        // Config validation makes this unreachable in practice
        error!("No revocation store source configured");
        return Err(ConfigError::MissingRevocationSource.into());
    };

    let revocation = Arc::new(
        RedisRevocationStore::connect(connection_info)
            .await
            .map_err(|e| {
                error!("Failed to connect to revocation store: {}", e);
                e
            })?,
    );
    info!("Revocation store connection established");

    // Renewal client for expired tokens
    let renewal = Arc::new(
        RenewalClient::new(config.token_refresh_url.clone()).map_err(|e| {
            error!("Failed to build renewal client: {}", e);
            e
        })?,
    );

    // Copied out before config moves into AppState
    let bind_address = config.bind_address.clone();
    let drain_seconds = config.drain_seconds;

    // Create application state
    let state = Arc::new(AppState {
        config,
        codec,
        revocation,
        renewal,
    });

    let app = build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Auth Gateway listening on {}", addr);

    // Start server with graceful shutdown support
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(drain_seconds))
    .await?;

    info!("Auth Gateway shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and the drain period is complete.
async fn shutdown_signal(drain_seconds: u64) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    // Graceful shutdown drain period
    if drain_seconds > 0 {
        warn!("Draining connections for {} seconds...", drain_seconds);
        tokio::time::sleep(Duration::from_secs(drain_seconds)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (AG_DRAIN_SECONDS=0)");
    }
}
