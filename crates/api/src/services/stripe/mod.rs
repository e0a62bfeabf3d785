//! Stripe Checkout integration.
//!
//! This module provides:
//! - [`StripeClient`] for creating and polling Checkout Sessions
//! - Wire types for sessions and webhook events
//! - Webhook signature verification
//!
//! # Flow
//!
//! 1. The API maps a package id to its fixed price and creates a session
//! 2. The customer pays on Stripe's hosted page
//! 3. Either the webhook (`checkout.session.completed`) or a status poll
//!    moves the recorded transaction to `paid`, at most once

mod client;
mod error;
mod types;
mod webhook;

pub use client::{CheckoutRequest, StripeClient};
pub use error::StripeError;
pub use types::{CheckoutSession, WebhookEvent, WebhookEventData};
pub use webhook::{SIGNATURE_TOLERANCE_SECS, verify_signature};
