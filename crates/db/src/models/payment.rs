//! Payment attempt and refund entity models.

use boxoffice_core::status::{PaymentStatus, RefundStatus};
use boxoffice_core::types::{Cents, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `payments` table: one charge attempt against an order.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub order_id: DbId,
    #[serde(skip_serializing)]
    pub idempotency_key: String,
    #[serde(skip_serializing)]
    pub request_hash: String,
    pub method: String,
    pub provider: Option<String>,
    pub provider_payment_id: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: PaymentStatus,
    pub amount_cents: Cents,
    #[serde(skip_serializing)]
    pub provider_payload: Option<serde_json::Value>,
    pub approved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for claiming an idempotency key with a PENDING payment row.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: DbId,
    pub idempotency_key: String,
    pub request_hash: String,
    pub method: String,
    pub amount_cents: Cents,
}

/// A row from the `refunds` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Refund {
    pub id: DbId,
    pub order_id: DbId,
    pub payment_id: DbId,
    pub amount_cents: Cents,
    #[sqlx(try_from = "String")]
    pub status: RefundStatus,
    pub reason_code: String,
    pub actor_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// DTO for inserting a refund.
#[derive(Debug, Clone)]
pub struct NewRefund {
    pub order_id: DbId,
    pub payment_id: DbId,
    pub amount_cents: Cents,
    pub reason_code: String,
    pub actor_id: Option<DbId>,
}
