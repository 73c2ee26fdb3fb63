//! Ticket entity model.

use boxoffice_core::status::TicketStatus;
use boxoffice_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `tickets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Ticket {
    pub id: DbId,
    pub order_id: DbId,
    pub order_item_id: DbId,
    pub seat_id: DbId,
    pub qr_code: String,
    #[sqlx(try_from = "String")]
    pub status: TicketStatus,
    pub used_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One ticket to mint for an order item.
#[derive(Debug, Clone)]
pub struct NewTicket {
    pub order_item_id: DbId,
    pub seat_id: DbId,
    pub qr_code: String,
}
