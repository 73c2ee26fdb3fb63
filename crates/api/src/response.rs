//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::checkout::Created;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn json(data: T) -> Json<Self> {
        Json(Self { data })
    }
}

/// Response for an idempotent create: 201 on first execution, 200 when the
/// stored result is replayed.
pub struct CreatedResponse<T: Serialize>(pub Created<T>);

impl<T: Serialize> IntoResponse for CreatedResponse<T> {
    fn into_response(self) -> Response {
        let status = if self.0.replayed {
            StatusCode::OK
        } else {
            StatusCode::CREATED
        };
        (status, DataResponse::json(self.0.value)).into_response()
    }
}
