//! Hosted checkout route handlers.
//!
//! The charged amount always comes from the server-side package table. A
//! session is recorded when it is created and its status is refreshed by
//! polling and by signed webhook events.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;
use url::Url;

use souq_core::PaymentStatus;
use souq_core::payment::find_package;

use crate::db::payments::{NewTransaction, PaymentRepository};
use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::models::CurrentUser;
use crate::services::stripe::{CheckoutRequest, StripeError, WebhookEvent, verify_signature};
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
const ASYNC_PAYMENT_SUCCEEDED: &str = "checkout.session.async_payment_succeeded";

#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    pub package_id: String,
    pub origin_url: String,
    /// Refused when present; prices are fixed per package.
    #[serde(default)]
    pub amount: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub status: String,
    pub payment_status: PaymentStatus,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// The scheme, host and port of the frontend that started checkout.
fn parse_origin(origin_url: &str) -> Result<String, AppError> {
    let url = Url::parse(origin_url.trim())
        .map_err(|_| AppError::BadRequest("Invalid origin_url".to_owned()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(AppError::BadRequest(
            "origin_url must be an http(s) URL".to_owned(),
        ));
    }
    Ok(url.origin().ascii_serialization())
}

/// Open a hosted checkout page for a package.
#[instrument(skip(state, body), fields(package_id = %body.package_id))]
pub async fn checkout(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CheckoutBody>,
) -> Result<Json<CheckoutResponse>, AppError> {
    if body.amount.is_some() {
        return Err(AppError::BadRequest(
            "Amount cannot be set by the client".to_owned(),
        ));
    }
    let package = find_package(&body.package_id)
        .ok_or_else(|| AppError::BadRequest("Invalid package".to_owned()))?;
    let stripe = state.stripe().ok_or(AppError::NotConfigured("Stripe"))?;
    let origin = parse_origin(&body.origin_url)?;

    let success_url = format!("{origin}/payment-success?session_id={{CHECKOUT_SESSION_ID}}");
    let cancel_url = format!("{origin}/cart");

    let session = stripe
        .create_checkout_session(&CheckoutRequest {
            package,
            user_id: user.id,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await?;
    let url = session
        .url
        .clone()
        .ok_or_else(|| StripeError::Response("checkout session has no url".to_owned()))?;

    PaymentRepository::new(state.pool())
        .create(&NewTransaction {
            session_id: &session.id,
            user_id: user.id,
            package_id: package.id,
            amount: package.amount,
            currency: package.currency.as_str(),
            metadata: json!({
                "user_id": user.id,
                "package_id": package.id,
                "origin": origin,
            }),
        })
        .await?;

    tracing::info!(session_id = %session.id, amount = %package.amount, "Checkout session opened");
    Ok(Json(CheckoutResponse {
        url,
        session_id: session.id,
    }))
}

/// Poll the provider for a session and record what it reports.
#[instrument(skip(state))]
pub async fn status(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiPath(session_id): ApiPath<String>,
) -> Result<Json<PaymentStatusResponse>, AppError> {
    let payments = PaymentRepository::new(state.pool());
    let transaction = payments
        .get_by_session(&session_id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment session"))?;
    if transaction.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden("Not authorized".to_owned()));
    }

    let stripe = state.stripe().ok_or(AppError::NotConfigured("Stripe"))?;
    let session = stripe.retrieve_checkout_session(&session_id).await?;

    let newly_paid = payments
        .record_status(&session_id, session.status(), session.payment_status())
        .await?;
    if newly_paid {
        tracing::info!(session_id = %session_id, "Payment completed");
    }

    Ok(Json(PaymentStatusResponse {
        status: session.status().to_owned(),
        payment_status: session.payment_status(),
        amount_total: session.amount_total,
        currency: session.currency,
    }))
}

/// Signed provider events. Completed, paid sessions are marked paid once.
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let secret = state
        .config()
        .stripe
        .webhook_secret
        .as_ref()
        .ok_or(AppError::NotConfigured("Stripe webhook"))?;
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Stripe-Signature header".to_owned()))?;

    verify_signature(secret, signature, &body, Utc::now().timestamp()).map_err(|e| {
        tracing::warn!(error = %e, "Rejected webhook");
        AppError::BadRequest("Invalid signature".to_owned())
    })?;

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|_| AppError::BadRequest("Invalid webhook payload".to_owned()))?;
    tracing::debug!(event_id = %event.id, event_type = %event.event_type, "Webhook received");

    if matches!(
        event.event_type.as_str(),
        CHECKOUT_COMPLETED | ASYNC_PAYMENT_SUCCEEDED
    ) {
        let session = event
            .checkout_session()
            .map_err(|_| AppError::BadRequest("Invalid checkout session".to_owned()))?;
        if session.payment_status() == PaymentStatus::Paid {
            let newly_paid = PaymentRepository::new(state.pool())
                .mark_paid(&session.id)
                .await?;
            tracing::info!(session_id = %session.id, newly_paid, "Checkout session paid");
        }
    }

    Ok(Json(WebhookAck { received: true }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_keeps_scheme_host_and_port() {
        assert_eq!(
            parse_origin("https://shop.example.com/cart?x=1").unwrap(),
            "https://shop.example.com"
        );
        assert_eq!(
            parse_origin("http://localhost:3000/").unwrap(),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_origin_rejects_other_schemes() {
        assert!(parse_origin("javascript:alert(1)").is_err());
        assert!(parse_origin("ftp://example.com").is_err());
        assert!(parse_origin("not a url").is_err());
    }

    #[test]
    fn test_checkout_body_detects_amount() {
        let body: CheckoutBody = serde_json::from_value(json!({
            "package_id": "basic",
            "origin_url": "https://shop.example.com",
            "amount": 1,
        }))
        .unwrap();
        assert!(body.amount.is_some());

        let body: CheckoutBody = serde_json::from_value(json!({
            "package_id": "basic",
            "origin_url": "https://shop.example.com",
        }))
        .unwrap();
        assert!(body.amount.is_none());
    }
}
