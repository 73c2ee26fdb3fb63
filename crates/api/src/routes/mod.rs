pub mod checkin;
pub mod health;
pub mod holds;
pub mod orders;
pub mod payments;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sessions/{id}/seats                 seat map (GET)
/// /sessions/{id}/seats/available       claimable seats (GET)
/// /sessions/{id}/holds                 create hold (POST)
///
/// /holds/{id}                          get hold (GET)
///
/// /orders                              create order (POST, Idempotency-Key)
/// /orders/{id}                         get order (GET)
/// /orders/{id}/tickets                 list tickets (GET)
/// /orders/{id}/payments                list attempts (GET), charge (POST, Idempotency-Key)
/// /orders/{id}/refund                  refund (POST, X-Tenant-Id)
///
/// /payments/webhook                    gateway notification (POST)
///
/// /check-in                            admit a ticket (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/sessions", sessions::router())
        .nest("/holds", holds::router())
        .nest("/orders", orders::router())
        .nest("/payments", payments::router())
        .merge(checkin::router())
}
