//! Event and session entity models.
//!
//! Events and sessions are configured by the venue back office; the checkout
//! only reads them. The create DTOs exist for seeding and tests.

use boxoffice_core::status::{EventStatus, SessionStatus};
use boxoffice_core::types::{Cents, DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Event {
    pub id: DbId,
    pub tenant_id: DbId,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub status: EventStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    pub tenant_id: DbId,
    pub name: String,
    pub status: EventStatus,
}

/// A row from the `sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Session {
    pub id: DbId,
    pub event_id: DbId,
    pub starts_at: Timestamp,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub price_cents: Cents,
    pub currency_code: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSession {
    pub event_id: DbId,
    pub starts_at: Timestamp,
    pub status: SessionStatus,
    pub price_cents: Cents,
    pub currency_code: String,
}

/// A session joined with the event fields that gate sales.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SaleContext {
    pub session_id: DbId,
    pub event_id: DbId,
    pub tenant_id: DbId,
    #[sqlx(try_from = "String")]
    pub session_status: SessionStatus,
    #[sqlx(try_from = "String")]
    pub event_status: EventStatus,
    pub price_cents: Cents,
    pub currency_code: String,
}

impl SaleContext {
    /// Seats may be claimed and ordered only while the session is published
    /// and its event is neither a draft nor archived.
    pub fn is_on_sale(&self) -> bool {
        self.session_status == SessionStatus::Published
            && self.event_status == EventStatus::Published
    }
}
