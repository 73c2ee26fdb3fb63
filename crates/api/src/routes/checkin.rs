use axum::routing::post;
use axum::Router;

use crate::handlers::checkin;
use crate::state::AppState;

/// Venue entry route, merged at the API root.
pub fn router() -> Router<AppState> {
    Router::new().route("/check-in", post(checkin::check_in))
}
