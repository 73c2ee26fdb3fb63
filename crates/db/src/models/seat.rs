//! Seat entity model.

use boxoffice_core::seats::SeatRef;
use boxoffice_core::status::SeatStatus;
use boxoffice_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `seats` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Seat {
    pub id: DbId,
    pub session_id: DbId,
    pub sector_code: String,
    pub row_label: String,
    pub seat_number: i32,
    #[sqlx(try_from = "String")]
    pub status: SeatStatus,
    pub updated_at: Timestamp,
}

impl Seat {
    pub fn position(&self) -> SeatRef {
        SeatRef::new(&self.sector_code, &self.row_label, self.seat_number)
    }
}
