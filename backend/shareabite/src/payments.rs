//! Payment gateway client: order creation, payment lookup and callback
//! signature checks against a Razorpay-compatible REST API.
//!
//! ## Signatures
//!
//! The checkout callback carries `(order_id, payment_id, signature)` where
//! `signature = hex(HMAC-SHA256(key_secret, "{order_id}|{payment_id}"))`.
//! [`PaymentGateway::verify_signature`] recomputes it and compares in constant
//! time. Nothing here retries; upstream failures surface as
//! [`AppError::Upstream`].

use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::PaymentConfig;
use crate::errors::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

// ─────────────────────────────────────────────────────────
// REST response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    /// Minor currency units.
    pub amount: i64,
    pub currency: String,
    pub status: String,
    #[serde(default)]
    pub order_id: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PaymentGateway {
    client: Client,
    api_url: String,
    key_id: String,
    key_secret: String,
    currency: String,
}

impl PaymentGateway {
    pub fn new(client: Client, config: &PaymentConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            currency: config.currency.clone(),
        }
    }

    /// Create an auto-captured order for `amount_minor` in the configured currency.
    pub async fn create_order(&self, amount_minor: i64, receipt: &str) -> Result<Order> {
        let response = self
            .client
            .post(format!("{}/orders", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount_minor,
                "currency": self.currency,
                "receipt": receipt,
                "payment_capture": 1,
            }))
            .send()
            .await
            .map_err(transport_error)?;

        let order: Order = decode(response).await?;
        debug!("Created order {} for {} {}", order.id, order.amount, order.currency);
        Ok(order)
    }

    /// Fetch the authoritative record of a payment.
    pub async fn fetch_payment(&self, payment_id: &str) -> Result<Payment> {
        let response = self
            .client
            .get(format!("{}/payments/{payment_id}", self.api_url))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .send()
            .await
            .map_err(transport_error)?;

        decode(response).await
    }

    /// Check a checkout callback signature.
    pub fn verify_signature(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<()> {
        let expected = expected_signature(&self.key_secret, order_id, payment_id)?;
        if signatures_match(&expected, signature) {
            Ok(())
        } else {
            Err(AppError::SignatureMismatch)
        }
    }
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;

    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .and_then(|e| match (e.error.description, e.error.code) {
                (Some(description), _) => Some(description),
                (None, Some(code)) => Some(code),
                (None, None) => None,
            })
            .unwrap_or_else(|| format!("HTTP {status}"));
        return Err(AppError::Upstream(detail));
    }

    serde_json::from_str(&body)
        .map_err(|e| AppError::Upstream(format!("unexpected response body: {e}")))
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::Upstream(e.to_string())
}

// ─────────────────────────────────────────────────────────
// Signature and amount helpers
// ─────────────────────────────────────────────────────────

/// Lower-case hex HMAC-SHA256 of `message` under `secret`.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Config(format!("invalid payment secret: {e}")))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// The signature the gateway issues for an order/payment pair.
pub fn expected_signature(secret: &str, order_id: &str, payment_id: &str) -> Result<String> {
    hmac_sha256_hex(secret, &format!("{order_id}|{payment_id}"))
}

/// Constant-time comparison of two hex signatures.
pub fn signatures_match(expected: &str, provided: &str) -> bool {
    let expected = expected.as_bytes();
    let provided = provided.trim().as_bytes();
    expected.len() == provided.len() && expected.ct_eq(provided).unwrap_u8() == 1
}

/// Convert a major-unit amount to minor units, rejecting anything below 1.
pub fn to_minor_units(amount: f64) -> Result<i64> {
    if !amount.is_finite() || amount < 1.0 {
        return Err(AppError::BadRequest("Invalid amount".to_string()));
    }
    Ok((amount * 100.0).round() as i64)
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_matches_reference_vector() {
        let mac = hmac_sha256_hex("key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            mac,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn expected_signature_joins_with_pipe() {
        assert_eq!(
            expected_signature("s3cret", "order_1", "pay_1").unwrap(),
            hmac_sha256_hex("s3cret", "order_1|pay_1").unwrap()
        );
    }

    #[test]
    fn gateway_rejects_tampered_signature() {
        let gateway = PaymentGateway::new(
            Client::new(),
            &PaymentConfig {
                api_url: "http://127.0.0.1:1".to_string(),
                key_id: "rzp_test".to_string(),
                key_secret: "s3cret".to_string(),
                currency: "INR".to_string(),
            },
        );
        let good = expected_signature("s3cret", "order_1", "pay_1").unwrap();
        assert!(gateway.verify_signature("order_1", "pay_1", &good).is_ok());
        assert!(matches!(
            gateway.verify_signature("order_1", "pay_2", &good),
            Err(AppError::SignatureMismatch)
        ));
        assert!(matches!(
            gateway.verify_signature("order_1", "pay_1", "abc"),
            Err(AppError::SignatureMismatch)
        ));
    }

    #[test]
    fn signature_comparison_is_length_aware() {
        assert!(signatures_match("abcd", "abcd"));
        assert!(signatures_match("abcd", " abcd\n"));
        assert!(!signatures_match("abcd", "abc"));
        assert!(!signatures_match("abcd", "abce"));
    }

    #[test]
    fn amounts_round_to_minor_units() {
        assert_eq!(to_minor_units(1.0).unwrap(), 100);
        assert_eq!(to_minor_units(499.999).unwrap(), 50_000);
        assert_eq!(to_minor_units(12.34).unwrap(), 1_234);
        assert_eq!(to_minor_units(25_000_000.0).unwrap(), 2_500_000_000);
    }

    #[test]
    fn amounts_below_one_or_not_finite_are_rejected() {
        for bad in [0.0, 0.99, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(to_minor_units(bad), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn provider_error_envelope_parses() {
        let body = r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"The amount must be atleast INR 1.00"}}"#;
        let env: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(
            env.error.description.as_deref(),
            Some("The amount must be atleast INR 1.00")
        );
    }
}
