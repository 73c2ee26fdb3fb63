//! Seat identity normalisation for hold requests.
//!
//! A seat inside a session is identified by `(sector, row, number)`. Buyers
//! type sector and row labels by hand, so labels are compared after trimming,
//! collapsing inner whitespace and upper-casing.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum number of seats a single hold may claim.
pub const MAX_SEATS_PER_HOLD: usize = 20;

/// A seat coordinate as sent by the client: `{ "sector", "row", "number" }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatRef {
    pub sector: String,
    pub row: String,
    pub number: i32,
}

impl SeatRef {
    pub fn new(sector: impl Into<String>, row: impl Into<String>, number: i32) -> Self {
        Self {
            sector: sector.into(),
            row: row.into(),
            number,
        }
    }

    /// The canonical form used for comparisons and database lookups.
    pub fn normalized(&self) -> SeatRef {
        SeatRef {
            sector: normalize_label(&self.sector),
            row: normalize_label(&self.row),
            number: self.number,
        }
    }
}

impl std::fmt::Display for SeatRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.sector, self.row, self.number)
    }
}

/// Trim, collapse runs of whitespace to one space, and upper-case.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Normalise a hold request's seat list.
///
/// Rejects an empty list, more than [`MAX_SEATS_PER_HOLD`] seats, blank
/// labels, non-positive numbers, and any seat that appears twice once
/// normalised. All of these are caller errors, never races.
pub fn normalize_seat_request(seats: &[SeatRef]) -> Result<Vec<SeatRef>, CoreError> {
    if seats.is_empty() {
        return Err(CoreError::validation("at least one seat is required"));
    }
    if seats.len() > MAX_SEATS_PER_HOLD {
        return Err(CoreError::validation(format!(
            "at most {MAX_SEATS_PER_HOLD} seats may be held at once"
        )));
    }

    let mut seen = HashSet::with_capacity(seats.len());
    let mut normalized = Vec::with_capacity(seats.len());

    for seat in seats {
        let seat = seat.normalized();
        if seat.sector.is_empty() || seat.row.is_empty() {
            return Err(CoreError::validation("seat sector and row must not be empty"));
        }
        if seat.number <= 0 {
            return Err(CoreError::validation(format!(
                "seat number must be positive, got {}",
                seat.number
            )));
        }
        if !seen.insert(seat.clone()) {
            return Err(CoreError::validation(format!("duplicate seat {seat} in request")));
        }
        normalized.push(seat);
    }

    Ok(normalized)
}
