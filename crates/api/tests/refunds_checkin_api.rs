//! HTTP-level tests for refunds and venue check-in.

mod common;

use axum::http::StatusCode;
use common::{body_json, paid_order, post_json, post_json_with, seed_session, TENANT_ID};
use sqlx::PgPool;

async fn refund(app: &axum::Router, order_id: i64, tenant: i64) -> axum::response::Response {
    let tenant = tenant.to_string();
    post_json_with(
        app.clone(),
        &format!("/api/v1/orders/{order_id}/refund"),
        serde_json::json!({ "reason_code": "CUSTOMER_REQUEST" }),
        &[("x-tenant-id", tenant.as_str()), ("x-actor-id", "7")],
    )
    .await
}

async fn check_in(app: &axum::Router, code: &str) -> axum::response::Response {
    post_json(app.clone(), "/api/v1/check-in", serde_json::json!({ "qr_code": code })).await
}

// ---------------------------------------------------------------------------
// Refunds
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn refund_reverses_a_two_ticket_order(pool: PgPool) {
    let session_id = seed_session(&pool, 2).await;
    let app = common::build_test_app(pool.clone());
    let (order_id, _) = paid_order(&app, session_id, &[1, 2]).await;

    let response = refund(&app, order_id, TENANT_ID).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["payment"]["status"], "REFUNDED");
    assert_eq!(json["data"]["order"]["status"], "CANCELLED");
    assert_eq!(json["data"]["refund"]["amount_cents"], 11200);
    assert_eq!(json["data"]["refund"]["actor_id"], 7);
    assert_eq!(json["data"]["cancelled_tickets"], 2);
    assert_eq!(json["data"]["released_seats"], 2);

    let tickets: Vec<String> =
        sqlx::query_scalar("SELECT status FROM tickets WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&pool)
            .await
            .unwrap();
    assert_eq!(tickets, vec!["CANCELLED", "CANCELLED"]);

    let available: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM seats WHERE session_id = $1 AND status = 'AVAILABLE'",
    )
    .bind(session_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(available, 2);

    let refunds: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM refunds")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(refunds, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn second_refund_returns_409(pool: PgPool) {
    let session_id = seed_session(&pool, 1).await;
    let app = common::build_test_app(pool);
    let (order_id, _) = paid_order(&app, session_id, &[1]).await;
    refund(&app, order_id, TENANT_ID).await;

    let response = refund(&app, order_id, TENANT_ID).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refund_from_another_tenant_returns_404(pool: PgPool) {
    let session_id = seed_session(&pool, 1).await;
    let app = common::build_test_app(pool);
    let (order_id, _) = paid_order(&app, session_id, &[1]).await;

    let response = refund(&app, order_id, TENANT_ID + 1).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refund_without_tenant_header_returns_401(pool: PgPool) {
    let session_id = seed_session(&pool, 1).await;
    let app = common::build_test_app(pool);
    let (order_id, _) = paid_order(&app, session_id, &[1]).await;

    let response = post_json(
        app,
        &format!("/api/v1/orders/{order_id}/refund"),
        serde_json::json!({ "reason_code": "CUSTOMER_REQUEST" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refunding_an_unpaid_order_returns_409(pool: PgPool) {
    let session_id = seed_session(&pool, 1).await;
    let app = common::build_test_app(pool);
    let order_id = common::place_order(&app, session_id, &[1]).await;

    let response = refund(&app, order_id, TENANT_ID).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Check-in
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn ticket_admits_once(pool: PgPool) {
    let session_id = seed_session(&pool, 1).await;
    let app = common::build_test_app(pool);
    let (_, codes) = paid_order(&app, session_id, &[1]).await;

    let first = check_in(&app, &codes[0]).await;
    assert_eq!(first.status(), StatusCode::OK);
    let json = body_json(first).await;
    assert_eq!(json["data"]["status"], "USED");
    assert!(json["data"]["used_at"].is_string());

    let second = check_in(&app, &format!("  {}  ", codes[0])).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_check_ins_admit_once(pool: PgPool) {
    let session_id = seed_session(&pool, 1).await;
    let app = common::build_test_app(pool);
    let (_, codes) = paid_order(&app, session_id, &[1]).await;

    let (a, b) = futures::join!(check_in(&app, &codes[0]), check_in(&app, &codes[0]));

    let mut statuses = vec![a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refunded_ticket_is_gone(pool: PgPool) {
    let session_id = seed_session(&pool, 1).await;
    let app = common::build_test_app(pool);
    let (order_id, codes) = paid_order(&app, session_id, &[1]).await;
    refund(&app, order_id, TENANT_ID).await;

    let response = check_in(&app, &codes[0]).await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn check_in_racing_a_refund_is_admitted_or_gone(pool: PgPool) {
    const ROUNDS: i32 = 5;
    let session_id = seed_session(&pool, ROUNDS).await;
    let app = common::build_test_app(pool);

    for number in 1..=ROUNDS {
        let (order_id, codes) = paid_order(&app, session_id, &[number]).await;

        let (refunded, admitted) =
            futures::join!(refund(&app, order_id, TENANT_ID), check_in(&app, &codes[0]));

        assert_eq!(refunded.status(), StatusCode::OK, "round {number}");
        assert!(
            matches!(admitted.status(), StatusCode::OK | StatusCode::GONE),
            "round {number}: check-in returned {}",
            admitted.status()
        );
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_or_blank_code_is_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    assert_eq!(check_in(&app, "TKT-missing").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(check_in(&app, "   ").await.status(), StatusCode::BAD_REQUEST);
}
