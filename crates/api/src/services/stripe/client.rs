//! Stripe Checkout API client.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use souq_core::UserId;
use souq_core::payment::PaymentPackage;

use super::error::StripeError;
use super::types::{CheckoutSession, ErrorBody};

/// Stripe REST API base URL.
const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to open a hosted checkout page.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    pub package: &'static PaymentPackage,
    pub user_id: UserId,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

impl CheckoutRequest<'_> {
    /// Form fields for `POST /v1/checkout/sessions`.
    fn form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "payment".to_owned()),
            ("success_url", self.success_url.to_owned()),
            ("cancel_url", self.cancel_url.to_owned()),
            ("client_reference_id", self.user_id.to_string()),
            (
                "line_items[0][price_data][currency]",
                self.package.currency.as_str().to_owned(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                self.package.amount_minor().to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                self.package.name.to_owned(),
            ),
            ("line_items[0][quantity]", "1".to_owned()),
            ("metadata[user_id]", self.user_id.to_string()),
            ("metadata[package_id]", self.package.id.to_owned()),
        ]
    }
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    api_key: SecretString,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// # Errors
    ///
    /// Returns `StripeError::Config` if the HTTP client cannot be built.
    pub fn new(api_key: SecretString) -> Result<Self, StripeError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StripeError::Config(e.to_string()))?;
        Ok(Self { client, api_key })
    }

    /// Create a Checkout Session for a package.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Stripe rejects it.
    #[instrument(
        skip(self, request),
        fields(package = %request.package.id, user_id = %request.user_id)
    )]
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .post(format!("{STRIPE_API_BASE}/checkout/sessions"))
            .bearer_auth(self.api_key.expose_secret())
            .form(&request.form())
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        let session: CheckoutSession = parse_response(response).await?;
        debug!(session_id = %session.id, "Checkout session created");
        Ok(session)
    }

    /// Fetch the current state of a Checkout Session.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Stripe rejects it.
    #[instrument(skip(self))]
    pub async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        if !is_valid_session_id(session_id) {
            return Err(StripeError::Api {
                status: 404,
                message: "No such checkout session".to_owned(),
            });
        }

        let response = self
            .client
            .get(format!("{STRIPE_API_BASE}/checkout/sessions/{session_id}"))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| StripeError::Request(e.to_string()))?;

        parse_response(response).await
    }
}

async fn parse_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StripeError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| StripeError::Response(e.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.message.or(b.error.kind))
        .unwrap_or_else(|| "Unknown error".to_owned());
    error!(status = %status, message = %message, "Stripe API error");
    Err(StripeError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Session ids are opaque `cs_` tokens; anything else never reaches the URL.
fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 255
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use souq_core::payment::find_package;

    use super::*;

    #[test]
    fn checkout_form_uses_server_amount() {
        let request = CheckoutRequest {
            package: find_package("standard").unwrap(),
            user_id: UserId::new(),
            success_url: "https://shop.example/payment-success?session_id={CHECKOUT_SESSION_ID}",
            cancel_url: "https://shop.example/cart",
        };
        let form = request.form();
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap()
        };
        assert_eq!(get("mode"), "payment");
        assert_eq!(get("line_items[0][price_data][unit_amount]"), "2499");
        assert_eq!(get("line_items[0][price_data][currency]"), "usd");
        assert_eq!(get("metadata[package_id]"), "standard");
        assert_eq!(get("metadata[user_id]"), request.user_id.to_string());
    }

    #[test]
    fn session_id_validation() {
        assert!(is_valid_session_id("cs_test_a1B2c3"));
        assert!(!is_valid_session_id(""));
        assert!(!is_valid_session_id("../customers"));
        assert!(!is_valid_session_id("cs_1?expand=x"));
    }
}
