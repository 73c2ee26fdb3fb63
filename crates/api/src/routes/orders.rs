use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{orders, payments, refunds};
use crate::state::AppState;

/// Order routes mounted at `/orders`.
///
/// ```text
/// POST /                 -> create_order
/// GET  /{id}             -> get_order
/// GET  /{id}/tickets     -> list_tickets
/// GET  /{id}/payments    -> list_payments
/// POST /{id}/payments    -> charge_order
/// POST /{id}/refund      -> refund_order
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create_order))
        .route("/{id}", get(orders::get_order))
        .route("/{id}/tickets", get(orders::list_tickets))
        .route(
            "/{id}/payments",
            get(payments::list_payments).post(payments::charge_order),
        )
        .route("/{id}/refund", post(refunds::refund_order))
}
