//! Lazy expiry of holds and unpaid orders.
//!
//! Nothing sweeps expired reservations in the background. Whoever reads a
//! hold or order past its window flips it to EXPIRED and hands its seats
//! back, each step guarded by a conditional update so concurrent readers
//! expire it at most once. Expiry always commits in its own transaction so
//! the reader can then fail with Gone without rolling the release back.

use boxoffice_core::audit::{actions, resources};
use boxoffice_core::status::SeatStatus;
use boxoffice_core::types::{DbId, Timestamp};
use boxoffice_db::models::audit::CreateAuditLog;
use boxoffice_db::models::hold::Hold;
use boxoffice_db::models::order::Order;
use boxoffice_db::repositories::{AuditRepo, HoldRepo, OrderRepo, SeatRepo};
use boxoffice_db::{tx, DbPool};
use chrono::Utc;
use serde_json::json;
use sqlx::PgConnection;

/// Expire `hold_id` if it lapsed and release seats that no other live claim
/// references. Returns `true` if this call performed the expiry.
pub async fn expire_hold(
    conn: &mut PgConnection,
    hold_id: DbId,
    now: Timestamp,
) -> Result<bool, sqlx::Error> {
    if !HoldRepo::expire_if_lapsed(&mut *conn, hold_id, now).await? {
        return Ok(false);
    }
    let released = SeatRepo::release_for_hold(&mut *conn, hold_id, now).await?;

    AuditRepo::log(
        &mut *conn,
        &CreateAuditLog::new(actions::HOLD_EXPIRED, resources::HOLD, hold_id)
            .metadata(json!({ "released_seats": released })),
    )
    .await?;

    tracing::info!(hold_id, released, "Hold expired");
    Ok(true)
}

/// Expire an unpaid order whose hold window closed and release its seats.
pub async fn expire_order(
    conn: &mut PgConnection,
    order: &Order,
    now: Timestamp,
) -> Result<bool, sqlx::Error> {
    if !OrderRepo::expire_if_lapsed(&mut *conn, order.id, now).await? {
        return Ok(false);
    }
    let released = SeatRepo::transition_for_order(
        &mut *conn,
        order.id,
        SeatStatus::Held,
        SeatStatus::Available,
    )
    .await?;

    AuditRepo::log(
        &mut *conn,
        &CreateAuditLog::new(actions::ORDER_EXPIRED, resources::ORDER, order.id)
            .tenant(order.tenant_id)
            .metadata(json!({ "released_seats": released, "hold_id": order.hold_id })),
    )
    .await?;

    tracing::info!(order_id = order.id, released, "Order expired before payment");
    Ok(true)
}

/// Expire a hold in a transaction of its own.
pub async fn lapse_hold(pool: &DbPool, hold: &Hold) -> Result<(), sqlx::Error> {
    let mut tx = tx::begin(pool).await?;
    expire_hold(&mut tx, hold.id, Utc::now()).await?;
    tx.commit().await
}

/// Expire an order in a transaction of its own.
pub async fn lapse_order(pool: &DbPool, order: &Order) -> Result<(), sqlx::Error> {
    let mut tx = tx::begin(pool).await?;
    expire_order(&mut tx, order, Utc::now()).await?;
    tx.commit().await
}

/// Expire every lapsed hold and unpaid order that still claims one of
/// `seat_ids`, so abandoned reservations never block a new buyer.
///
/// Returns how many reservations were expired by this call.
pub async fn reclaim_lapsed(
    pool: &DbPool,
    seat_ids: &[DbId],
    now: Timestamp,
) -> Result<usize, sqlx::Error> {
    let mut reclaimed = 0;

    for order_id in OrderRepo::find_lapsed_for_seats(pool, seat_ids, now).await? {
        let Some(order) = OrderRepo::find_by_id(pool, order_id).await? else {
            continue;
        };
        let mut tx = tx::begin(pool).await?;
        if expire_order(&mut tx, &order, now).await? {
            reclaimed += 1;
        }
        tx.commit().await?;
    }

    for hold_id in HoldRepo::find_lapsed_for_seats(pool, seat_ids, now).await? {
        let mut tx = tx::begin(pool).await?;
        if expire_hold(&mut tx, hold_id, now).await? {
            reclaimed += 1;
        }
        tx.commit().await?;
    }

    if reclaimed > 0 {
        tracing::debug!(reclaimed, "Reclaimed lapsed reservations before claiming seats");
    }
    Ok(reclaimed)
}
