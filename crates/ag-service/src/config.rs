//! Auth Gateway configuration.
//!
//! Configuration is loaded from environment variables. The revocation store
//! connection is described either by a plain `REDIS_URL` or by a pair of
//! secret-manager endpoints that yield the connection info and password at
//! startup. Sensitive fields are redacted in Debug output.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default graceful-shutdown drain period in seconds.
pub const DEFAULT_DRAIN_SECONDS: u64 = 30;

/// Auth Gateway configuration.
///
/// Loaded from environment variables with sensible defaults.
/// The Redis URL may embed credentials and is redacted in Debug output.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Secret-manager endpoint returning the JWT signing secret.
    pub jwt_secret_url: String,

    /// Refresh endpoint used to renew expired tokens.
    pub token_refresh_url: String,

    /// Revocation store URL. Takes precedence over the secret-manager
    /// endpoints below when set.
    pub redis_url: Option<String>,

    /// Secret-manager endpoint returning `host:port:database` for the
    /// revocation store.
    pub redis_info_url: Option<String>,

    /// Secret-manager endpoint returning the revocation store password.
    pub redis_password_url: Option<String>,

    /// PEM bundle (client certificate chain + private key) presented to the
    /// secret manager for mutual TLS. Plain TLS when unset.
    pub tls_identity_path: Option<PathBuf>,

    /// Graceful-shutdown drain period in seconds (default: 30).
    pub drain_seconds: u64,
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("jwt_secret_url", &self.jwt_secret_url)
            .field("token_refresh_url", &self.token_refresh_url)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("redis_info_url", &self.redis_info_url)
            .field("redis_password_url", &self.redis_password_url)
            .field("tls_identity_path", &self.tls_identity_path)
            .field("drain_seconds", &self.drain_seconds)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid drain configuration: {0}")]
    InvalidDrainSeconds(String),

    #[error(
        "No revocation store source: set REDIS_URL, or both REDIS_INFO_URL and REDIS_PASSWORD_URL"
    )]
    MissingRevocationSource,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let jwt_secret_url = vars
            .get("JWT_SECRET_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET_URL".to_string()))?
            .clone();

        let token_refresh_url = vars
            .get("TOKEN_REFRESH_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("TOKEN_REFRESH_URL".to_string()))?
            .clone();

        let redis_url = vars.get("REDIS_URL").cloned();
        let redis_info_url = vars.get("REDIS_INFO_URL").cloned();
        let redis_password_url = vars.get("REDIS_PASSWORD_URL").cloned();

        // The store is reachable either directly or through the secret
        // manager; require one complete source.
        if redis_url.is_none() && (redis_info_url.is_none() || redis_password_url.is_none()) {
            return Err(ConfigError::MissingRevocationSource);
        }

        let tls_identity_path = vars.get("TLS_IDENTITY_PATH").cloned().map(PathBuf::from);

        // Parse drain period with validation
        let drain_seconds = if let Some(value_str) = vars.get("AG_DRAIN_SECONDS") {
            value_str.parse::<u64>().map_err(|e| {
                ConfigError::InvalidDrainSeconds(format!(
                    "AG_DRAIN_SECONDS must be a non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_DRAIN_SECONDS
        };

        Ok(Config {
            bind_address,
            jwt_secret_url,
            token_refresh_url,
            redis_url,
            redis_info_url,
            redis_password_url,
            tls_identity_path,
            drain_seconds,
        })
    }
}
