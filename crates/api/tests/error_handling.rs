//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly on `AppError` values; no server or
//! database is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use boxoffice_api::error::AppError;
use boxoffice_core::error::CoreError;
use http_body_util::BodyExt;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_error_returns_404() {
    let err = AppError::Core(CoreError::not_found("Order", 42));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
    assert_eq!(json["error"], "Order with id 42 not found");
}

#[tokio::test]
async fn validation_error_returns_400() {
    let err = AppError::Core(CoreError::validation("duplicate seat in request: A-1-1"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "duplicate seat in request: A-1-1");
}

#[tokio::test]
async fn conflict_error_returns_409() {
    let err = AppError::Core(CoreError::conflict("seat unavailable: A-1-1"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "seat unavailable: A-1-1");
}

#[tokio::test]
async fn gone_error_returns_410_not_409() {
    let err = AppError::Core(CoreError::gone("hold expired; select seats again"));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::GONE);
    assert_eq!(json["code"], "GONE");
}

#[tokio::test]
async fn unauthorized_error_returns_401() {
    let err = AppError::Core(CoreError::Unauthorized("invalid webhook signature".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn validator_errors_map_to_validation() {
    use validator::Validate;

    #[derive(Validate)]
    struct Body {
        #[validate(email)]
        email: String,
    }

    let errors = Body {
        email: "not-an-email".into(),
    }
    .validate()
    .unwrap_err();

    let (status, json) = error_to_response(AppError::from(errors)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert!(json["error"].as_str().unwrap().contains("email"));
}

// ---------------------------------------------------------------------------
// HTTP-level and internal errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn bad_request_error_returns_400() {
    let err = AppError::BadRequest("X-Tenant-Id must be a positive integer".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn internal_error_returns_500_and_sanitizes_message() {
    let err = AppError::InternalError("gateway credentials leaked".into());

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn core_internal_error_is_sanitized() {
    let err = AppError::Core(CoreError::Internal("stack trace".into()));

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "An internal error occurred");
}

#[tokio::test]
async fn row_not_found_returns_404() {
    let (status, json) = error_to_response(AppError::Database(sqlx::Error::RowNotFound)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn other_database_errors_are_sanitized() {
    let err = AppError::Database(sqlx::Error::PoolTimedOut);

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["code"], "INTERNAL_ERROR");
    assert_eq!(json["error"], "An internal error occurred");
}

// ---------------------------------------------------------------------------
// Real datastore errors
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn serialization_failure_returns_409(pool: sqlx::PgPool) {
    sqlx::query("CREATE TABLE counters (id INT PRIMARY KEY, v INT NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO counters VALUES (1, 0)")
        .execute(&pool)
        .await
        .unwrap();

    let mut tx = boxoffice_db::tx::begin_serializable(&pool).await.unwrap();
    sqlx::query("SELECT v FROM counters WHERE id = 1")
        .execute(&mut *tx)
        .await
        .unwrap();

    sqlx::query("UPDATE counters SET v = 1 WHERE id = 1")
        .execute(&pool)
        .await
        .unwrap();

    let err = sqlx::query("UPDATE counters SET v = 2 WHERE id = 1")
        .execute(&mut *tx)
        .await
        .unwrap_err();
    assert!(boxoffice_db::tx::is_serialization_failure(&err));

    let (status, json) = error_to_response(AppError::Database(err)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "concurrency conflict");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unique_violation_on_named_constraint_returns_409(pool: sqlx::PgPool) {
    sqlx::query("CREATE TABLE codes (code TEXT NOT NULL, CONSTRAINT uq_codes_code UNIQUE (code))")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("INSERT INTO codes VALUES ('a')")
        .execute(&pool)
        .await
        .unwrap();
    let err = sqlx::query("INSERT INTO codes VALUES ('a')")
        .execute(&pool)
        .await
        .unwrap_err();

    let (status, json) = error_to_response(AppError::Database(err)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().contains("uq_codes_code"));
}
