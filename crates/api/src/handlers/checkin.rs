use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::checkout::checkin::{self, CheckInRequest};
use crate::context::ActorContext;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/check-in
///
/// 409 if the ticket was already used, 410 if it was cancelled by a refund.
pub async fn check_in(
    actor: ActorContext,
    State(state): State<AppState>,
    Json(input): Json<CheckInRequest>,
) -> AppResult<impl IntoResponse> {
    let ticket = checkin::check_in(&state, &input.qr_code, actor.actor_id).await?;
    Ok(DataResponse::json(ticket))
}
