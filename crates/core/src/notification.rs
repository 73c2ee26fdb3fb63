//! Order confirmation seam.
//!
//! Rendering and delivering the e-mail is somebody else's job. The checkout
//! hands over an [`OrderConfirmation`] snapshot after an order is paid and
//! never waits for, or fails because of, the result.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Cents, DbId, Timestamp};

/// One issued ticket as shown in the confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTicket {
    pub qr_code: String,
    pub sector_code: String,
    pub row_label: String,
    pub seat_number: i32,
}

/// Everything the confirmation message needs, captured at PAID time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: DbId,
    pub tenant_id: DbId,
    pub session_id: DbId,
    pub buyer_name: String,
    pub buyer_email: String,
    pub total_amount_cents: Cents,
    pub currency_code: String,
    pub paid_at: Timestamp,
    pub tickets: Vec<ConfirmedTicket>,
}

#[derive(Debug, thiserror::Error)]
#[error("notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Delivers order confirmations to buyers.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_order_confirmation(
        &self,
        confirmation: &OrderConfirmation,
    ) -> Result<(), NotificationError>;
}

/// Sender that only logs; used when no mail transport is configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotificationSender;

#[async_trait]
impl NotificationSender for LoggingNotificationSender {
    async fn send_order_confirmation(
        &self,
        confirmation: &OrderConfirmation,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            order_id = confirmation.order_id,
            buyer_email = %confirmation.buyer_email,
            tickets = confirmation.tickets.len(),
            "Order confirmation ready for delivery",
        );
        Ok(())
    }
}
