//! Payment webhook payload and HMAC signature verification.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::CoreError;
use crate::hashing;
use crate::status::PaymentStatus;

/// Header carrying the hex HMAC-SHA256 of the raw webhook body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

type HmacSha256 = Hmac<Sha256>;

/// Body posted by the gateway when a payment settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWebhook {
    pub provider_payment_id: String,
    pub status: PaymentStatus,
}

impl PaymentWebhook {
    /// Gateways only report settlement outcomes.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.provider_payment_id.trim().is_empty() {
            return Err(CoreError::validation("provider_payment_id must not be empty"));
        }
        match self.status {
            PaymentStatus::Approved | PaymentStatus::Denied => Ok(()),
            other => Err(CoreError::validation(format!(
                "webhook status must be APPROVED or DENIED, got {other}"
            ))),
        }
    }
}

/// Compute the hex HMAC-SHA256 signature of `body` under `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    hashing::hex_encode(mac.finalize().into_bytes())
}

/// Verify a hex signature in constant time.
pub fn verify_signature(
    secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), CoreError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Unauthorized("missing webhook signature".into()))?;
    let expected = hashing::hex_decode(signature)
        .ok_or_else(|| CoreError::Unauthorized("malformed webhook signature".into()))?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| CoreError::Unauthorized("invalid webhook signature".into()))
}
