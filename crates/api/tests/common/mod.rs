#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use boxoffice_api::config::{CheckoutConfig, ServerConfig};
use boxoffice_api::router::build_app_router;
use boxoffice_api::state::AppState;
use boxoffice_core::payment::SimulatedGateway;
use boxoffice_core::seats::SeatRef;
use boxoffice_core::status::{EventStatus, SessionStatus};
use boxoffice_db::models::session::{CreateEvent, CreateSession};
use boxoffice_db::repositories::{SeatRepo, SessionRepo};
use boxoffice_events::EventBus;

pub const TENANT_ID: i64 = 1;
pub const SEAT_PRICE_CENTS: i64 = 5000;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        db_max_connections: 5,
        checkout: CheckoutConfig::default(),
    }
}

/// Build the full application router, middleware included, over `pool`.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        gateway: Arc::new(SimulatedGateway),
        event_bus: Arc::new(EventBus::default()),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_json_with(app, uri, body, &[]).await
}

/// POST a JSON body with extra headers.
pub async fn post_json_with(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    headers: &[(&str, &str)],
) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn new_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A published session priced at [`SEAT_PRICE_CENTS`] with seats `A-1-1..=n`.
pub async fn seed_session(pool: &PgPool, seats: i32) -> i64 {
    let event = SessionRepo::create_event(
        pool,
        &CreateEvent {
            tenant_id: TENANT_ID,
            name: "Opening Night".to_string(),
            status: EventStatus::Published,
        },
    )
    .await
    .unwrap();
    let session = SessionRepo::create_session(
        pool,
        &CreateSession {
            event_id: event.id,
            starts_at: Utc::now() + Duration::days(7),
            status: SessionStatus::Published,
            price_cents: SEAT_PRICE_CENTS,
            currency_code: "BRL".to_string(),
        },
    )
    .await
    .unwrap();

    let positions: Vec<SeatRef> = (1..=seats).map(|n| SeatRef::new("A", "1", n)).collect();
    let mut conn = pool.acquire().await.unwrap();
    SeatRepo::create_many(&mut conn, session.id, &positions)
        .await
        .unwrap();
    session.id
}

pub fn seat(number: i32) -> serde_json::Value {
    serde_json::json!({ "sector": "A", "row": "1", "number": number })
}

/// Hold seats and return the hold id.
pub async fn hold_seats(app: &Router, session_id: i64, numbers: &[i32]) -> i64 {
    let seats: Vec<_> = numbers.iter().map(|n| seat(*n)).collect();
    let response = post_json(
        app.clone(),
        &format!("/api/v1/sessions/{session_id}/holds"),
        serde_json::json!({ "seats": seats }),
    )
    .await;
    assert_eq!(response.status(), 201, "hold should be created");
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

pub fn order_body(hold_id: i64) -> serde_json::Value {
    serde_json::json!({
        "hold_id": hold_id,
        "buyer": { "name": "Ana Souza", "email": "ana@example.com" }
    })
}

pub async fn create_order(app: &Router, hold_id: i64, key: &str) -> Response {
    post_json_with(
        app.clone(),
        "/api/v1/orders",
        order_body(hold_id),
        &[("idempotency-key", key)],
    )
    .await
}

/// Hold, order and return the order id.
pub async fn place_order(app: &Router, session_id: i64, numbers: &[i32]) -> i64 {
    let hold_id = hold_seats(app, session_id, numbers).await;
    let response = create_order(app, hold_id, &new_key()).await;
    assert_eq!(response.status(), 201, "order should be created");
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

pub async fn charge(app: &Router, order_id: i64, body: serde_json::Value, key: &str) -> Response {
    post_json_with(
        app.clone(),
        &format!("/api/v1/orders/{order_id}/payments"),
        body,
        &[("idempotency-key", key)],
    )
    .await
}

pub fn card(token: &str) -> serde_json::Value {
    serde_json::json!({ "method": "CREDIT_CARD", "card_token": token })
}

/// Hold, order and pay by card. Returns `(order_id, ticket codes)`.
pub async fn paid_order(app: &Router, session_id: i64, numbers: &[i32]) -> (i64, Vec<String>) {
    let order_id = place_order(app, session_id, numbers).await;
    let response = charge(app, order_id, card("tok_visa"), &new_key()).await;
    assert_eq!(response.status(), 201, "charge should be recorded");
    let json = body_json(response).await;
    assert_eq!(json["data"]["order"]["status"], "PAID");
    let codes = json["data"]["tickets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["qr_code"].as_str().unwrap().to_string())
        .collect();
    (order_id, codes)
}
