//! Payment gateway seam and the simulated gateway used in development.
//!
//! The checkout never talks to a processor directly; it calls a
//! [`PaymentGateway`] implementation outside of any database transaction and
//! records whatever the gateway returned.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Cents, DbId};

/// Default upper bound on payment attempts per order.
pub const DEFAULT_MAX_PAYMENT_ATTEMPTS: i64 = 5;

/// How the buyer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    /// Instant bank transfer; settled asynchronously through the webhook.
    Pix,
}

impl PaymentMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "CREDIT_CARD",
            PaymentMethod::DebitCard => "DEBIT_CARD",
            PaymentMethod::Pix => "PIX",
        }
    }

    /// Instant methods need no card token.
    pub const fn is_instant(self) -> bool {
        matches!(self, PaymentMethod::Pix)
    }
}

/// What the checkout asks the gateway to charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeRequest {
    pub method: PaymentMethod,
    pub card_token: Option<String>,
    pub amount_cents: Cents,
    pub currency_code: String,
    pub order_id: DbId,
}

impl ChargeRequest {
    /// Reject requests no gateway would accept.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.amount_cents <= 0 {
            return Err(CoreError::validation("charge amount must be positive"));
        }
        let has_token = self
            .card_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty());
        if !self.method.is_instant() && !has_token {
            return Err(CoreError::validation(format!(
                "card_token is required for {}",
                self.method.as_str()
            )));
        }
        Ok(())
    }
}

/// The gateway's verdict on a charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayStatus {
    Approved,
    Denied,
    /// Accepted but not yet settled; the final status arrives by webhook.
    Pending,
}

/// Result of a charge as reported by the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayCharge {
    pub provider: String,
    pub provider_payment_id: String,
    pub status: GatewayStatus,
    pub payload: serde_json::Value,
}

/// Errors from talking to the gateway (as opposed to a denied charge).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway rejected request: {0}")]
    InvalidRequest(String),

    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

impl From<GatewayError> for CoreError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidRequest(msg) => CoreError::Validation(msg),
            GatewayError::Unavailable(msg) => {
                CoreError::Internal(format!("payment gateway unavailable: {msg}"))
            }
        }
    }
}

/// A payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge the given amount. A declined card is `Ok` with
    /// [`GatewayStatus::Denied`]; `Err` means the gateway could not decide.
    async fn charge(&self, request: &ChargeRequest) -> Result<GatewayCharge, GatewayError>;
}

/// Card tokens starting with this prefix are declined by [`SimulatedGateway`].
pub const SIMULATED_DECLINE_PREFIX: &str = "tok_decline";

/// Deterministic in-process gateway for development and tests.
///
/// Cards are approved unless the token starts with
/// [`SIMULATED_DECLINE_PREFIX`]; PIX charges come back `PENDING` and are
/// settled by webhook.
#[derive(Debug, Clone, Default)]
pub struct SimulatedGateway;

impl SimulatedGateway {
    pub const PROVIDER: &'static str = "simulated";
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<GatewayCharge, GatewayError> {
        request
            .validate()
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let status = match (&request.method, request.card_token.as_deref()) {
            (PaymentMethod::Pix, _) => GatewayStatus::Pending,
            (_, Some(token)) if token.starts_with(SIMULATED_DECLINE_PREFIX) => {
                GatewayStatus::Denied
            }
            _ => GatewayStatus::Approved,
        };

        let provider_payment_id = format!("sim_{}", uuid::Uuid::new_v4().simple());

        Ok(GatewayCharge {
            provider: Self::PROVIDER.to_string(),
            provider_payment_id,
            status,
            payload: serde_json::json!({
                "order_id": request.order_id,
                "amount_cents": request.amount_cents,
                "currency_code": request.currency_code,
                "method": request.method.as_str(),
            }),
        })
    }
}
