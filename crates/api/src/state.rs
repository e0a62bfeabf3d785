//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::stripe::{StripeClient, StripeError};
use crate::services::token::token_lifetime;
use crate::services::{EmailService, TokenService, UploadStore};

/// Error building the shared services.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("invalid SMTP configuration: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("failed to build Stripe client: {0}")]
    Stripe(#[from] StripeError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    tokens: TokenService,
    uploads: UploadStore,
    email: Option<EmailService>,
    stripe: Option<StripeClient>,
}

impl AppState {
    /// Build the state, wiring optional services from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the SMTP relay or the Stripe HTTP client cannot be
    /// set up.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let tokens = TokenService::new(&config.jwt_secret, token_lifetime());
        let uploads = UploadStore::new(config.upload_dir.clone(), config.public_base_url.clone());
        let email = config.smtp.as_ref().map(EmailService::new).transpose()?;
        let stripe = config
            .stripe
            .api_key
            .clone()
            .map(StripeClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                uploads,
                email,
                stripe,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn uploads(&self) -> &UploadStore {
        &self.inner.uploads
    }

    /// The mailer, when SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// The Stripe client, when an API key is configured.
    #[must_use]
    pub fn stripe(&self) -> Option<&StripeClient> {
        self.inner.stripe.as_ref()
    }
}
