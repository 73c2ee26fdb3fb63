//! Order and order item entity models.

use boxoffice_core::status::OrderStatus;
use boxoffice_core::types::{Cents, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `orders` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub tenant_id: DbId,
    pub session_id: DbId,
    pub hold_id: DbId,
    #[serde(skip_serializing)]
    pub idempotency_key: String,
    #[serde(skip_serializing)]
    pub request_hash: String,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_document: Option<String>,
    pub ticket_subtotal_cents: Cents,
    pub service_fee_cents: Cents,
    pub total_amount_cents: Cents,
    pub currency_code: String,
    pub hold_expires_at: Timestamp,
    pub commercial_policy_version: String,
    pub paid_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Everything needed to insert an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub tenant_id: DbId,
    pub session_id: DbId,
    pub hold_id: DbId,
    pub idempotency_key: String,
    pub request_hash: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_document: Option<String>,
    pub ticket_subtotal_cents: Cents,
    pub service_fee_cents: Cents,
    pub total_amount_cents: Cents,
    pub currency_code: String,
    pub hold_expires_at: Timestamp,
    pub commercial_policy_version: String,
}

/// A row from the `order_items` table. Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderItem {
    pub id: DbId,
    pub order_id: DbId,
    pub seat_id: DbId,
    pub sector_code: String,
    pub row_label: String,
    pub seat_number: i32,
    pub unit_price_cents: Cents,
    pub created_at: Timestamp,
}

/// One line of a new order, priced at creation time.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub seat_id: DbId,
    pub sector_code: String,
    pub row_label: String,
    pub seat_number: i32,
    pub unit_price_cents: Cents,
}
