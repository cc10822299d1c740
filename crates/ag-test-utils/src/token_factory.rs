//! Builder patterns for test token construction
//!
//! Provides a fluent API for minting tokens signed with a fixed secret,
//! plus the base64url form of that secret for wiring into a test server.

use ag_service::auth::Claims;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

/// Fixed HMAC secret every test token is signed with.
pub const TEST_SIGNING_SECRET: [u8; 32] = [42; 32];

/// A different secret, for signature-mismatch cases.
pub const OTHER_SIGNING_SECRET: [u8; 32] = [13; 32];

/// The test signing secret in the base64url form the secret manager serves.
pub fn test_secret_base64url() -> String {
    URL_SAFE_NO_PAD.encode(TEST_SIGNING_SECRET)
}

/// Builder for creating signed test tokens
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_subject("alice")
///     .with_authorities(&["ROLE_USER", "ROLE_ADMIN"])
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    sub: String,
    authorities: Vec<String>,
    exp: i64,
    iat: i64,
    secret: [u8; 32],
}

impl TestTokenBuilder {
    /// Create a new token builder with defaults
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            sub: "test-subject".to_string(),
            authorities: Vec::new(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
            secret: TEST_SIGNING_SECRET,
        }
    }

    /// Set the subject
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = subject.to_string();
        self
    }

    /// Set the authorities carried in the `AUTHORITIES` claim
    pub fn with_authorities(mut self, authorities: &[&str]) -> Self {
        self.authorities = authorities.iter().map(|a| (*a).to_string()).collect();
        self
    }

    /// Set expiration in seconds from now (negative for an expired token)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Sign with a secret other than the fixture default
    pub fn signed_with(mut self, secret: [u8; 32]) -> Self {
        self.secret = secret;
        self
    }

    /// Sign and return the compact token
    pub fn build(self) -> String {
        let claims = Claims {
            sub: self.sub,
            authorities: self.authorities,
            exp: self.exp,
            iat: self.iat,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .expect("test token should encode")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
