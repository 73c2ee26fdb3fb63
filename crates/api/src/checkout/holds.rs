//! Seat holds: turning a seat selection into a time-bounded exclusive claim.

use std::collections::HashSet;

use boxoffice_core::audit::{actions, resources};
use boxoffice_core::error::CoreError;
use boxoffice_core::holds::{hold_expires_at, hold_is_lapsed};
use boxoffice_core::seats::{normalize_seat_request, SeatRef};
use boxoffice_core::status::{HoldStatus, SeatStatus};
use boxoffice_core::types::DbId;
use boxoffice_db::models::audit::CreateAuditLog;
use boxoffice_db::models::hold::Hold;
use boxoffice_db::models::seat::Seat;
use boxoffice_db::repositories::{AuditRepo, HoldRepo, SeatRepo, SessionRepo};
use boxoffice_db::tx;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::expiry;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for `POST /sessions/{id}/holds`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateHoldRequest {
    pub seats: Vec<SeatRef>,
}

/// A hold together with the seats it claims.
#[derive(Debug, Clone, Serialize)]
pub struct HoldView {
    #[serde(flatten)]
    pub hold: Hold,
    pub seats: Vec<Seat>,
}

/// Claim `seats` in `session_id` for the configured hold window.
///
/// Either every requested seat moves AVAILABLE -> HELD or none does.
pub async fn create_hold(
    state: &AppState,
    session_id: DbId,
    seats: &[SeatRef],
) -> AppResult<HoldView> {
    let requested = normalize_seat_request(seats)?;

    let sale = SessionRepo::find_sale_context(&state.pool, session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", session_id))?;
    if !sale.is_on_sale() {
        return Err(CoreError::conflict("session is not open for sale").into());
    }

    let found = SeatRepo::find_by_positions(&state.pool, session_id, &requested).await?;
    if found.len() != requested.len() {
        let known: HashSet<SeatRef> = found.iter().map(Seat::position).collect();
        let missing = requested
            .iter()
            .find(|seat| !known.contains(*seat))
            .map(ToString::to_string)
            .unwrap_or_default();
        return Err(CoreError::not_found("Seat", missing).into());
    }
    let seat_ids: Vec<DbId> = found.iter().map(|s| s.id).collect();

    let now = Utc::now();
    expiry::reclaim_lapsed(&state.pool, &seat_ids, now).await?;

    let mut tx = tx::begin(&state.pool).await?;

    let current = SeatRepo::find_by_ids(&mut *tx, &seat_ids).await?;
    if let Some(taken) = current.iter().find(|s| s.status != SeatStatus::Available) {
        return Err(CoreError::conflict(format!("seat unavailable: {}", taken.position())).into());
    }

    let expires_at = hold_expires_at(now, state.config.checkout.hold_ttl_secs);
    let hold = HoldRepo::create(&mut tx, session_id, expires_at, &seat_ids).await?;

    let moved =
        SeatRepo::transition(&mut *tx, &seat_ids, SeatStatus::Available, SeatStatus::Held).await?;
    if moved != seat_ids.len() as u64 {
        tracing::warn!(
            session_id,
            requested = seat_ids.len(),
            moved,
            "Lost race reserving seats"
        );
        return Err(CoreError::conflict("concurrency conflict reserving seats").into());
    }

    AuditRepo::log(
        &mut *tx,
        &CreateAuditLog::new(actions::HOLD_CREATED, resources::HOLD, hold.id)
            .tenant(sale.tenant_id)
            .metadata(json!({ "session_id": session_id, "seat_ids": seat_ids })),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(hold_id = hold.id, session_id, seats = seat_ids.len(), "Hold created");

    let seats = HoldRepo::list_seats(&state.pool, hold.id).await?;
    Ok(HoldView { hold, seats })
}

/// Load a hold, expiring it first if its window has closed.
pub async fn get_hold(state: &AppState, hold_id: DbId) -> AppResult<HoldView> {
    let hold = HoldRepo::find_by_id(&state.pool, hold_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Hold", hold_id))?;

    if hold_is_lapsed(hold.status, hold.expires_at, Utc::now()) {
        expiry::lapse_hold(&state.pool, &hold).await?;
        return Err(hold_expired());
    }
    if hold.status == HoldStatus::Expired {
        return Err(hold_expired());
    }

    let seats = HoldRepo::list_seats(&state.pool, hold.id).await?;
    Ok(HoldView { hold, seats })
}

pub(crate) fn hold_expired() -> AppError {
    CoreError::gone("hold expired; select seats again").into()
}
