//! Handlers for orders and their tickets.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use boxoffice_core::types::DbId;
use boxoffice_db::repositories::TicketRepo;

use crate::checkout::orders::{self, find_order, CreateOrderRequest};
use crate::context::IdempotencyKey;
use crate::error::AppResult;
use crate::response::{CreatedResponse, DataResponse};
use crate::state::AppState;

/// POST /api/v1/orders
///
/// Turn an active hold into an order awaiting payment. Requires an
/// `Idempotency-Key`; repeating the same request returns the same order
/// with 200 instead of 201.
pub async fn create_order(
    State(state): State<AppState>,
    IdempotencyKey(key): IdempotencyKey,
    Json(input): Json<CreateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let created = orders::create_order(&state, &key, &input).await?;
    Ok(CreatedResponse(created))
}

/// GET /api/v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = orders::get_order(&state, order_id).await?;
    Ok(DataResponse::json(order))
}

/// GET /api/v1/orders/{id}/tickets
///
/// Empty until the order is paid.
pub async fn list_tickets(
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = find_order(&state, order_id).await?;
    let tickets = TicketRepo::list_by_order(&state.pool, order.id).await?;
    Ok(DataResponse::json(tickets))
}
