//! Seat map reads.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use boxoffice_core::error::CoreError;
use boxoffice_core::types::DbId;
use boxoffice_db::repositories::{SeatRepo, SessionRepo};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

async fn ensure_session(state: &AppState, session_id: DbId) -> AppResult<()> {
    SessionRepo::find_session(&state.pool, session_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Session", session_id))?;
    Ok(())
}

/// GET /api/v1/sessions/{id}/seats
///
/// Every seat of the session with its current status.
pub async fn list_seats(
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_session(&state, session_id).await?;
    let seats = SeatRepo::list_by_session(&state.pool, session_id, None).await?;
    Ok(DataResponse::json(seats))
}

/// GET /api/v1/sessions/{id}/seats/available
pub async fn list_available_seats(
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_session(&state, session_id).await?;
    let seats = SeatRepo::list_available(&state.pool, session_id).await?;
    Ok(DataResponse::json(seats))
}
