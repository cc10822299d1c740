//! Bearer token claims.
//!
//! The token issuer writes the role list under the literal claim key
//! `AUTHORITIES`; the serde rename keeps the wire form while the Rust
//! field stays idiomatic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Decoded token claims.
///
/// `sub` identifies the end user and is propagated downstream in the
/// `AUTH-ID` header; `authorities` is propagated as a JSON array in the
/// `AUTH-AUTHORITIES` header.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user identifier).
    pub sub: String,

    /// Ordered role list, e.g. `["ROLE_USER", "ROLE_ADMIN"]`.
    #[serde(rename = "AUTHORITIES", default)]
    pub authorities: Vec<String>,

    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,

    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
}

/// Custom Debug implementation that redacts the subject.
impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &"[REDACTED]")
            .field("authorities", &self.authorities)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .finish()
    }
}

impl Claims {
    /// Renders the role list as the JSON array carried by the
    /// `AUTH-AUTHORITIES` header.
    pub fn authorities_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.authorities)
    }
}
