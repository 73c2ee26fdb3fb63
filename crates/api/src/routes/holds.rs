use axum::routing::get;
use axum::Router;

use crate::handlers::holds;
use crate::state::AppState;

/// Hold routes mounted at `/holds`.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(holds::get_hold))
}
