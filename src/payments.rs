use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    errors::{ApiError, ApiResult},
    state::PaymentConfig,
};

type HmacSha256 = Hmac<Sha256>;

/// Verify the gateway's HMAC-SHA256 signature over `"{order_id}|{payment_id}"`.
///
/// Comparison is constant time via the hmac crate's `verify_slice`.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature_hex: &str,
) -> bool {
    let expected = match hex::decode(signature_hex) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Create a payment order at the gateway. Amounts are in minor currency units
/// (the gateway counts paise, 100 to a rupee).
pub async fn create_order(
    client: &reqwest::Client,
    config: &PaymentConfig,
    amount: i64,
) -> ApiResult<String> {
    let amount_minor = amount
        .checked_mul(100)
        .ok_or_else(|| ApiError::Validation("Amount is too large".to_string()))?;

    let receipt = format!("rcpt_{}", Uuid::new_v4().simple());
    let request = serde_json::json!({
        "amount": amount_minor,
        "currency": "INR",
        "receipt": receipt,
    });

    let response = client
        .post(format!("{}/orders", config.api_url))
        .basic_auth(&config.key_id, Some(&config.key_secret))
        .json(&request)
        .send()
        .await
        .map_err(|err| ApiError::Internal(format!("payment order request failed: {err}")))?;

    if !response.status().is_success() {
        return Err(ApiError::Internal(format!(
            "payment gateway returned {}",
            response.status()
        )));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|err| ApiError::Internal(format!("payment order response unreadable: {err}")))?;

    body["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ApiError::Internal("payment order response missing id".to_string()))
}
