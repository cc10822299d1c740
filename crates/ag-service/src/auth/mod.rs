//! Token verification and key provisioning for the Auth Gateway.
//!
//! # Components
//!
//! - `claims` - decoded token claims and their header renderings
//! - `codec` - signature/expiry verification against the process key
//! - `secret_client` - startup fetch of the signing secret and revocation
//!   store credentials from the secret manager

pub mod claims;
pub mod codec;
pub mod secret_client;

pub use claims::Claims;
pub use codec::{SigningKey, TokenCodec, Verification};
pub use secret_client::{RedisSettings, SecretClient};
