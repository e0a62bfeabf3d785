//! Stripe Checkout wire types.
//!
//! Only the fields this service reads are modelled.
//!
//! See: <https://docs.stripe.com/api/checkout/sessions/object>

use std::collections::HashMap;

use serde::Deserialize;

use souq_core::PaymentStatus;

/// A Checkout Session as returned by create and retrieve.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page; only present while the session is open.
    #[serde(default)]
    pub url: Option<String>,
    /// `open`, `complete` or `expired`.
    #[serde(default)]
    pub status: Option<String>,
    /// `paid`, `unpaid` or `no_payment_required`.
    pub payment_status: String,
    /// In minor units.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSession {
    /// The payment status, treating unknown values as unpaid.
    #[must_use]
    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status.parse().unwrap_or(PaymentStatus::Unpaid)
    }

    #[must_use]
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("open")
    }
}

/// Error envelope Stripe returns with 4xx/5xx responses.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// A webhook event. `data.object` is kept raw and decoded per event type.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// The checkout session carried by `checkout.session.*` events.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is not a checkout session.
    pub fn checkout_session(&self) -> Result<CheckoutSession, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}
