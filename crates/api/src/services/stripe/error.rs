//! Stripe-related errors.

use thiserror::Error;

/// Errors that can occur when talking to Stripe.
#[derive(Debug, Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("Stripe request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Stripe response error: {0}")]
    Response(String),

    /// Stripe rejected the call.
    #[error("Stripe API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid webhook signature.
    #[error("Invalid Stripe signature: {0}")]
    InvalidSignature(String),

    /// Failed to parse a webhook payload.
    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    /// Client could not be built.
    #[error("Stripe configuration error: {0}")]
    Config(String),
}
