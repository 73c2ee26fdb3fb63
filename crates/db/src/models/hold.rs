//! Hold entity model.

use boxoffice_core::status::HoldStatus;
use boxoffice_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `holds` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Hold {
    pub id: DbId,
    pub session_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: HoldStatus,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
