use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{holds, sessions};
use crate::state::AppState;

/// Session-scoped routes mounted at `/sessions`.
///
/// ```text
/// GET  /{id}/seats            -> list_seats
/// GET  /{id}/seats/available  -> list_available_seats
/// POST /{id}/holds            -> create_hold
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/seats", get(sessions::list_seats))
        .route("/{id}/seats/available", get(sessions::list_available_seats))
        .route("/{id}/holds", post(holds::create_hold))
}
