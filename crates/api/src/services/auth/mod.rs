//! Authentication service.
//!
//! Password registration and login, token issuing, and the emailed
//! four-digit password reset flow.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use souq_core::password_reset::{ResetRejection, reset_code_ttl};
use souq_core::{Email, UserRole};

use crate::db::RepositoryError;
use crate::db::password_resets::{ConsumeOutcome, PasswordResetRepository};
use crate::db::users::{NewUser, UserRepository};
use crate::models::{CurrentUser, User};
use crate::services::email::{EmailService, generate_reset_code};
use crate::services::token::TokenService;

/// Minimum password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Registration form after deserialization.
#[derive(Debug)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub role: UserRole,
}

/// A signed-in user and their access token.
#[derive(Debug, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// What happened to a freshly generated reset code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetDelivery {
    /// Sent by email.
    Emailed,
    /// No mailer is configured outside production; the caller shows the code.
    Returned(String),
    /// Nothing to report to the caller (unknown email, or production without
    /// a mailer).
    Silent,
}

pub struct AuthService<'a> {
    pool: &'a PgPool,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self { pool, tokens }
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RoleNotAllowed` for `admin`, `InvalidEmail`,
    /// `WeakPassword` or `EmptyName` for bad input, and `EmailTaken` if the
    /// address is registered.
    pub async fn register(&self, form: &Registration<'_>) -> Result<AuthSession, AuthError> {
        if !form.role.is_self_service() {
            return Err(AuthError::RoleNotAllowed);
        }
        let user = create_account(self.pool, form).await?;
        self.session_for(user)
    }

    /// Check credentials and sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let Some((user, hash)) = UserRepository::new(self.pool)
            .get_password_hash(&email)
            .await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &hash)?;
        self.session_for(user)
    }

    /// Generate and store a reset code for `email`, replacing earlier codes.
    ///
    /// Unknown addresses produce no record and [`ResetDelivery::Silent`], so
    /// the response does not reveal whether an account exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address, or
    /// `AuthError::Email` if delivery fails.
    pub async fn request_password_reset(
        &self,
        email: &str,
        mailer: Option<&EmailService>,
        expose_code: bool,
    ) -> Result<ResetDelivery, AuthError> {
        let email = Email::parse(email)?;

        let Some(user) = UserRepository::new(self.pool).get_by_email(&email).await? else {
            tracing::info!("Password reset requested for unknown email");
            return Ok(ResetDelivery::Silent);
        };

        let code = generate_reset_code();
        PasswordResetRepository::new(self.pool)
            .replace(&email, &code, Utc::now() + reset_code_ttl())
            .await?;

        if let Some(mailer) = mailer {
            mailer.send_password_reset(&email, &user.name, &code).await?;
            return Ok(ResetDelivery::Emailed);
        }

        if expose_code {
            tracing::warn!(user_id = %user.id, "SMTP not configured, returning reset code");
            Ok(ResetDelivery::Returned(code))
        } else {
            tracing::error!(user_id = %user.id, "SMTP not configured, reset code not delivered");
            Ok(ResetDelivery::Silent)
        }
    }

    /// Consume a reset code and set a new password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Reset` if the code is wrong, used or expired, and
    /// `WeakPassword` if the new password is too short.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email).map_err(|_| ResetRejection::InvalidCode)?;
        validate_password(new_password)?;

        let resets = PasswordResetRepository::new(self.pool);
        let latest = resets
            .latest(&email)
            .await?
            .ok_or(ResetRejection::InvalidCode)?;
        latest.state().check(code, Utc::now())?;

        let password_hash = hash_password(new_password)?;
        match resets.consume(latest.id, &email, &password_hash).await {
            Ok(ConsumeOutcome::Consumed) => {
                tracing::info!("Password reset completed");
                Ok(())
            }
            Ok(ConsumeOutcome::AlreadyUsed) => Err(ResetRejection::AlreadyUsed.into()),
            Err(RepositoryError::NotFound) => Err(ResetRejection::InvalidCode.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AuthError> {
        let token = self.tokens.issue(CurrentUser {
            id: user.id,
            role: user.role,
        })?;
        Ok(AuthSession { token, user })
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

/// Create an account with any role, without signing in.
///
/// Used by registration and by the CLI to create admins.
///
/// # Errors
///
/// Same as [`AuthService::register`] apart from the role check.
pub async fn create_account(pool: &PgPool, form: &Registration<'_>) -> Result<User, AuthError> {
    let email = Email::parse(form.email)?;
    validate_password(form.password)?;
    let name = form.name.trim();
    if name.is_empty() {
        return Err(AuthError::EmptyName);
    }

    let password_hash = hash_password(form.password)?;
    let user = UserRepository::new(pool)
        .create(&NewUser {
            email: &email,
            name,
            phone: form.phone.map(str::trim).filter(|s| !s.is_empty()),
            address: form.address.map(str::trim).filter(|s| !s.is_empty()),
            role: form.role,
            password_hash: &password_hash,
        })
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::EmailTaken,
            other => AuthError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, role = %user.role, "Account created");
    Ok(user)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("za3tar-and-sumac").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("za3tar-and-sumac", &hash).is_ok());
        assert!(matches!(
            verify_password("Za3tar-and-sumac", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("x", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        // Six characters, more than six bytes.
        assert!(validate_password("سوقسوق").is_ok());
    }
}
