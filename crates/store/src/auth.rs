//! Turning an auth provider's access token into a [`UserSession`].
//!
//! Tokens are HS256 JWTs whose `sub` claim is the user's id. The provider
//! issues them; this side only verifies.

use jotpad_core::session::UserSession;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// Claims read from an access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's id.
    pub sub: Uuid,
    pub email: Option<String>,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

/// Configuration for verifying access tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the auth provider.
    pub secret: String,
    /// Required `aud` claim, if the provider sets one.
    pub audience: Option<String>,
}

impl JwtConfig {
    /// Load from the environment.
    ///
    /// | Env Var               | Required | Default |
    /// |-----------------------|----------|---------|
    /// | `JOTPAD_JWT_SECRET`   | **yes**  | --      |
    /// | `JOTPAD_JWT_AUDIENCE` | no       | none    |
    ///
    /// # Panics
    ///
    /// Panics if `JOTPAD_JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret = std::env::var("JOTPAD_JWT_SECRET")
            .expect("JOTPAD_JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JOTPAD_JWT_SECRET must not be empty");

        Self {
            secret,
            audience: std::env::var("JOTPAD_JWT_AUDIENCE").ok(),
        }
    }
}

/// Validate an access token and return the session it names.
///
/// Signature and expiration are checked; any failure is an
/// authentication error.
pub fn verify_access_token(token: &str, config: &JwtConfig) -> Result<UserSession, StoreError> {
    let mut validation = Validation::default(); // HS256, validates exp
    match &config.audience {
        Some(audience) => validation.set_audience(&[audience]),
        None => validation.validate_aud = false,
    }

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| StoreError::InvalidSession(e.to_string()))?;

    Ok(UserSession {
        user_id: data.claims.sub,
        email: data.claims.email,
    })
}
