//! Handlers for seat holds.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use boxoffice_core::types::DbId;

use crate::checkout::holds::{self, CreateHoldRequest};
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/sessions/{id}/holds
///
/// Claim a set of seats for the hold window. 409 if any seat is taken.
pub async fn create_hold(
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(input): Json<CreateHoldRequest>,
) -> AppResult<impl IntoResponse> {
    let hold = holds::create_hold(&state, session_id, &input.seats).await?;
    Ok((StatusCode::CREATED, DataResponse::json(hold)))
}

/// GET /api/v1/holds/{id}
///
/// 410 once the hold window has closed.
pub async fn get_hold(
    State(state): State<AppState>,
    Path(hold_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let hold = holds::get_hold(&state, hold_id).await?;
    Ok(DataResponse::json(hold))
}
