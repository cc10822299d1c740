//! Token verification.
//!
//! The codec is a pure function of `(token, signing key)`: every parse or
//! verification failure is converted into a tagged [`Verification`] outcome,
//! never a panic or an uncaught error. The signing key is built once at
//! startup from the secret-manager response and is immutable for the
//! process lifetime (no rotation; a restart picks up a new key).

use crate::auth::claims::Claims;
use crate::errors::AgError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};

/// Maximum accepted token length in bytes. Anything larger is rejected
/// before parsing.
pub const MAX_TOKEN_BYTES: usize = 8192;

/// Minimum decoded HMAC key length for HS256.
pub const MIN_HMAC_KEY_BYTES: usize = 32;

/// Symmetric HMAC-SHA256 verification key.
///
/// Decoded from the base64url secret string returned by the secret manager.
/// Padding in the encoded form is accepted and ignored.
pub struct SigningKey {
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // DecodingKey holds secret material and implements neither Debug
        // nor a redacted view, so print only the type name.
        f.debug_struct("SigningKey").finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Decodes the base64url secret into key material.
    ///
    /// Fails when the secret is not valid base64url or decodes to fewer
    /// than [`MIN_HMAC_KEY_BYTES`] bytes.
    pub fn from_base64url(secret: &SecretString) -> Result<Self, AgError> {
        let trimmed = secret.expose_secret().trim_end_matches('=');
        let bytes = URL_SAFE_NO_PAD.decode(trimmed).map_err(|e| {
            AgError::SecretUnavailable(format!("signing secret is not valid base64url: {}", e))
        })?;

        if bytes.len() < MIN_HMAC_KEY_BYTES {
            return Err(AgError::SecretUnavailable(format!(
                "signing secret must decode to at least {} bytes, got {}",
                MIN_HMAC_KEY_BYTES,
                bytes.len()
            )));
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(&bytes),
        })
    }
}

/// Outcome of verifying a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Signature and expiry both check out.
    Valid(Claims),

    /// Correctly signed but past expiry. Claims are still extracted so the
    /// renewal flow can run.
    Expired(Claims),

    /// Compact shape and algorithm are fine but the signature does not
    /// match the process key.
    MalformedSignature,

    /// Not the expected compact token shape, or signed with an algorithm
    /// this gateway does not accept.
    UnsupportedFormat,

    /// Any other structural problem: empty input, oversized input, broken
    /// base64, claims that are not JSON, missing required claims.
    Malformed,
}

/// Verifies bearer tokens against the process-wide signing key.
///
/// Shared as `Arc<TokenCodec>` across request tasks; holds no mutable
/// state.
pub struct TokenCodec {
    decoding_key: DecodingKey,
    validation: Validation,
    expired_validation: Validation,
}

impl TokenCodec {
    pub fn new(key: SigningKey) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Zero leeway: a token one second past exp must classify as Expired
        // so renewal triggers immediately.
        validation.leeway = 0;

        let mut expired_validation = validation.clone();
        expired_validation.validate_exp = false;

        Self {
            decoding_key: key.decoding_key,
            validation,
            expired_validation,
        }
    }

    /// Classifies a token as one of the [`Verification`] outcomes.
    ///
    /// Never fails: malformed input of any kind maps to a rejection
    /// outcome.
    pub fn verify(&self, token: &str) -> Verification {
        if token.is_empty() {
            return Verification::Malformed;
        }
        if token.len() > MAX_TOKEN_BYTES {
            tracing::debug!(
                target: "ag.auth.codec",
                token_len = token.len(),
                "token exceeds size cap"
            );
            return Verification::Malformed;
        }

        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Verification::Valid(data.claims),
            Err(err) => self.classify_failure(token, &err),
        }
    }

    fn classify_failure(&self, token: &str, err: &jsonwebtoken::errors::Error) -> Verification {
        match err.kind() {
            ErrorKind::ExpiredSignature => {
                // Second decode with the exp check waived; the signature is
                // still enforced, so claims from expired tokens are trusted.
                match decode::<Claims>(token, &self.decoding_key, &self.expired_validation) {
                    Ok(data) => Verification::Expired(data.claims),
                    Err(second) => {
                        tracing::debug!(
                            target: "ag.auth.codec",
                            error = %second,
                            "expired token failed claim extraction"
                        );
                        Verification::Malformed
                    }
                }
            }
            ErrorKind::InvalidSignature => Verification::MalformedSignature,
            ErrorKind::InvalidToken
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName => Verification::UnsupportedFormat,
            _ => {
                tracing::debug!(target: "ag.auth.codec", error = %err, "token failed verification");
                Verification::Malformed
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    const TEST_SECRET: [u8; 32] = [7; 32];
    const OTHER_SECRET: [u8; 32] = [9; 32];

    fn test_codec() -> TokenCodec {
        let encoded = URL_SAFE_NO_PAD.encode(TEST_SECRET);
        let key = SigningKey::from_base64url(&SecretString::from(encoded)).unwrap();
        TokenCodec::new(key)
    }

    fn sample_claims(exp_offset: i64) -> Claims {
        let now = chrono::Utc::now().timestamp();
        Claims {
            sub: "user-1".to_string(),
            authorities: vec!["ROLE_USER".to_string(), "ROLE_ADMIN".to_string()],
            exp: now + exp_offset,
            iat: now - 60,
        }
    }

    fn sign(claims: &impl Serialize, secret: &[u8]) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    // ==================== Signing key ====================

    #[test]
    fn test_signing_key_rejects_short_secret() {
        let encoded = URL_SAFE_NO_PAD.encode([1u8; 16]);
        let err = SigningKey::from_base64url(&SecretString::from(encoded)).unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(msg) if msg.contains("at least")));
    }

    #[test]
    fn test_signing_key_accepts_padded_encoding() {
        // Secret managers commonly hand out padded base64url
        let encoded = base64::engine::general_purpose::URL_SAFE.encode(TEST_SECRET);
        assert!(encoded.ends_with('='));

        assert!(SigningKey::from_base64url(&SecretString::from(encoded)).is_ok());
    }

    #[test]
    fn test_signing_key_rejects_invalid_base64() {
        let err =
            SigningKey::from_base64url(&SecretString::from("!!!not-base64!!!".to_string()))
                .unwrap_err();

        assert!(matches!(err, AgError::SecretUnavailable(msg) if msg.contains("base64url")));
    }

    // ==================== Classification ====================

    #[test]
    fn test_valid_token_round_trip() {
        let codec = test_codec();
        let claims = sample_claims(3600);
        let token = sign(&claims, &TEST_SECRET);

        assert_eq!(codec.verify(&token), Verification::Valid(claims));
    }

    #[test]
    fn test_expired_token_yields_claims() {
        let codec = test_codec();
        let claims = sample_claims(-1);
        let token = sign(&claims, &TEST_SECRET);

        match codec.verify(&token) {
            Verification::Expired(extracted) => {
                assert_eq!(extracted.sub, "user-1");
                assert_eq!(extracted.authorities, claims.authorities);
                assert_eq!(extracted.exp, claims.exp);
            }
            other => panic!("expected Expired, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_key_is_malformed_signature() {
        let codec = test_codec();
        let token = sign(&sample_claims(3600), &OTHER_SECRET);

        assert_eq!(codec.verify(&token), Verification::MalformedSignature);
    }

    #[test]
    fn test_expired_token_with_wrong_key_is_malformed_signature() {
        // Claim extraction from expired tokens must never bypass the
        // signature check.
        let codec = test_codec();
        let token = sign(&sample_claims(-1), &OTHER_SECRET);

        assert_eq!(codec.verify(&token), Verification::MalformedSignature);
    }

    #[test]
    fn test_tampered_payload_is_malformed_signature() {
        let codec = test_codec();
        let token = sign(&sample_claims(3600), &TEST_SECRET);

        let mut parts = token.split('.');
        let header = parts.next().unwrap();
        let _payload = parts.next().unwrap();
        let signature = parts.next().unwrap();

        let mut forged = sample_claims(3600);
        forged.sub = "mallory".to_string();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());

        let tampered = format!("{}.{}.{}", header, forged_payload, signature);
        assert_eq!(codec.verify(&tampered), Verification::MalformedSignature);
    }

    #[test]
    fn test_hs384_token_is_unsupported() {
        let codec = test_codec();
        let token = encode(
            &Header::new(Algorithm::HS384),
            &sample_claims(3600),
            &EncodingKey::from_secret(&TEST_SECRET),
        )
        .unwrap();

        assert_eq!(codec.verify(&token), Verification::UnsupportedFormat);
    }

    #[test]
    fn test_two_segment_token_is_unsupported() {
        let codec = test_codec();
        assert_eq!(codec.verify("abc.def"), Verification::UnsupportedFormat);
    }

    #[test]
    fn test_non_compact_input_is_unsupported() {
        let codec = test_codec();
        assert_eq!(
            codec.verify("definitely-not-a-token"),
            Verification::UnsupportedFormat
        );
    }

    #[test]
    fn test_empty_token_is_malformed() {
        let codec = test_codec();
        assert_eq!(codec.verify(""), Verification::Malformed);
    }

    #[test]
    fn test_oversized_token_is_malformed() {
        let codec = test_codec();
        let token = "a".repeat(MAX_TOKEN_BYTES + 1);

        assert_eq!(codec.verify(&token), Verification::Malformed);
    }

    #[test]
    fn test_signed_non_json_payload_is_malformed() {
        let codec = test_codec();

        // Correctly signed, so the failure is the claims parse, not the
        // signature check.
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode("this is not json");
        let message = format!("{}.{}", header, payload);
        let signature = jsonwebtoken::crypto::sign(
            message.as_bytes(),
            &EncodingKey::from_secret(&TEST_SECRET),
            Algorithm::HS256,
        )
        .unwrap();

        let token = format!("{}.{}", message, signature);
        assert_eq!(codec.verify(&token), Verification::Malformed);
    }

    #[test]
    fn test_missing_exp_is_malformed() {
        #[derive(Serialize)]
        struct NoExpiry {
            sub: String,
            iat: i64,
        }

        let codec = test_codec();
        let token = sign(
            &NoExpiry {
                sub: "user-1".to_string(),
                iat: chrono::Utc::now().timestamp(),
            },
            &TEST_SECRET,
        );

        assert_eq!(codec.verify(&token), Verification::Malformed);
    }

    #[test]
    fn test_valid_token_without_authorities() {
        #[derive(Serialize)]
        struct NoAuthorities {
            sub: String,
            exp: i64,
            iat: i64,
        }

        let codec = test_codec();
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &NoAuthorities {
                sub: "user-1".to_string(),
                exp: now + 3600,
                iat: now,
            },
            &TEST_SECRET,
        );

        match codec.verify(&token) {
            Verification::Valid(claims) => assert!(claims.authorities.is_empty()),
            other => panic!("expected Valid, got {:?}", other),
        }
    }
}
