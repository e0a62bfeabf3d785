//! Stripe webhook signature verification.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
//! Each `v1` value is an HMAC-SHA256 of `"{t}.{payload}"` keyed with the
//! endpoint secret.
//!
//! See: <https://docs.stripe.com/webhooks#verify-manually>

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use super::error::StripeError;

/// Largest accepted distance between the signed timestamp and now.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Verify `payload` against a `Stripe-Signature` header at time `now`.
///
/// # Errors
///
/// Returns `StripeError::InvalidSignature` if the header is malformed, the
/// timestamp is outside the tolerance, or no `v1` signature matches.
pub fn verify_signature(
    secret: &SecretString,
    header: &str,
    payload: &[u8],
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| StripeError::InvalidSignature("missing timestamp".to_owned()))?;
    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature("invalid timestamp".to_owned()))?;

    if (now - signed_at).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(StripeError::InvalidSignature(
            "timestamp outside tolerance".to_owned(),
        ));
    }
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature("no v1 signature".to_owned()));
    }

    let mac = signed_payload_mac(secret, timestamp, payload)?;
    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate).is_ok_and(|bytes| mac.clone().verify_slice(&bytes).is_ok())
    });

    if matched {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature("signature mismatch".to_owned()))
    }
}

fn signed_payload_mac(
    secret: &SecretString,
    timestamp: &str,
    payload: &[u8],
) -> Result<Hmac<Sha256>, StripeError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| StripeError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;
    const BODY: &[u8] = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;

    fn secret() -> SecretString {
        SecretString::from("whsec_test_secret".to_owned())
    }

    fn sign(timestamp: i64, body: &[u8]) -> String {
        let mac = signed_payload_mac(&secret(), &timestamp.to_string(), body).unwrap();
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_valid_signature() {
        let header = format!("t={NOW},v1={}", sign(NOW, BODY));
        assert!(verify_signature(&secret(), &header, BODY, NOW + 10).is_ok());
    }

    #[test]
    fn accepts_any_matching_v1() {
        let header = format!("t={NOW},v1=deadbeef,v0=ignored,v1={}", sign(NOW, BODY));
        assert!(verify_signature(&secret(), &header, BODY, NOW).is_ok());
    }

    #[test]
    fn rejects_tampered_body() {
        let header = format!("t={NOW},v1={}", sign(NOW, BODY));
        let result = verify_signature(&secret(), &header, b"{}", NOW);
        assert!(matches!(result, Err(StripeError::InvalidSignature(_))));
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = format!("t={NOW},v1={}", sign(NOW, BODY));
        let other = SecretString::from("whsec_other".to_owned());
        assert!(verify_signature(&other, &header, BODY, NOW).is_err());
    }

    #[test]
    fn rejects_stale_timestamp() {
        let header = format!("t={NOW},v1={}", sign(NOW, BODY));
        let result = verify_signature(&secret(), &header, BODY, NOW + SIGNATURE_TOLERANCE_SECS + 1);
        assert!(matches!(result, Err(StripeError::InvalidSignature(_))));
    }

    #[test]
    fn rejects_malformed_headers() {
        let timestamp_only = format!("t={NOW}");
        for header in ["", "v1=abc", "t=abc,v1=abc", timestamp_only.as_str()] {
            assert!(
                verify_signature(&secret(), header, BODY, NOW).is_err(),
                "{header}"
            );
        }
    }
}
