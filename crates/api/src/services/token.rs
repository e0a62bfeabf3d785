//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs carrying the user id and role. Verification needs
//! only the secret, so authenticating a request never touches the database.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use souq_core::{UserId, UserRole};

use crate::models::CurrentUser;

/// How long an issued token stays valid.
#[must_use]
pub fn token_lifetime() -> Duration {
    Duration::days(30)
}

/// Claims carried inside an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: UserId,
    pub role: UserRole,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

impl Claims {
    #[must_use]
    pub const fn current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.sub,
            role: self.role,
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("invalid or expired token")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("keys", &"[REDACTED]")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    #[must_use]
    pub fn new(secret: &SecretString, lifetime: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation: Validation::default(),
            lifetime,
        }
    }

    /// Sign a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue(&self, user: CurrentUser) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Check the signature and expiry of `token`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if the token is malformed, tampered
    /// with or expired.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}
