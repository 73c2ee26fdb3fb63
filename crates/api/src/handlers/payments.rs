//! Handlers for payment attempts and gateway notifications.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use boxoffice_core::types::DbId;
use boxoffice_core::webhook::SIGNATURE_HEADER;

use crate::checkout::payments::{self, ChargeOrderRequest};
use crate::context::IdempotencyKey;
use crate::error::AppResult;
use crate::response::{CreatedResponse, DataResponse};
use crate::state::AppState;

/// POST /api/v1/orders/{id}/payments
///
/// Charge the order total. A denied charge still returns the recorded
/// attempt; the client may retry under a new `Idempotency-Key`.
pub async fn charge_order(
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
    IdempotencyKey(key): IdempotencyKey,
    Json(input): Json<ChargeOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let created = payments::charge(&state, order_id, &key, &input).await?;
    Ok(CreatedResponse(created))
}

/// GET /api/v1/orders/{id}/payments
pub async fn list_payments(
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let attempts = payments::list_payments(&state, order_id).await?;
    Ok(DataResponse::json(attempts))
}

/// POST /api/v1/payments/webhook
///
/// The body is taken raw so the signature covers exactly what was sent.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    let outcome = payments::process_webhook(&state, &body, signature).await?;
    Ok(DataResponse::json(outcome))
}
