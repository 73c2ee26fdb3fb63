//! Repository for the `seats` table.
//!
//! Seat status is only ever changed through conditional updates of the form
//! "set these ids to X where the status is still Y". The returned count is
//! the number of rows that actually moved; a count lower than requested
//! means another transaction got there first.

use boxoffice_core::seats::SeatRef;
use boxoffice_core::status::{HoldStatus, OrderStatus, SeatStatus};
use boxoffice_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor};

use crate::models::seat::Seat;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, session_id, sector_code, row_label, seat_number, status, updated_at";

/// Seat inventory: the single source of truth for availability.
pub struct SeatRepo;

impl SeatRepo {
    // ── Venue configuration ──────────────────────────────────────────

    /// Insert a batch of AVAILABLE seats for a session.
    ///
    /// Positions are stored in their normalised form.
    pub async fn create_many(
        conn: &mut PgConnection,
        session_id: DbId,
        positions: &[SeatRef],
    ) -> Result<Vec<Seat>, sqlx::Error> {
        let (sectors, rows, numbers) = split_positions(positions);
        let query = format!(
            "INSERT INTO seats (session_id, sector_code, row_label, seat_number) \
             SELECT $1, sector, row_label, number \
             FROM UNNEST($2::text[], $3::text[], $4::int4[]) AS p(sector, row_label, number) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Seat>(&query)
            .bind(session_id)
            .bind(&sectors)
            .bind(&rows)
            .bind(&numbers)
            .fetch_all(conn)
            .await
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Every seat of a session, optionally filtered by status.
    pub async fn list_by_session(
        executor: impl PgExecutor<'_>,
        session_id: DbId,
        status: Option<SeatStatus>,
    ) -> Result<Vec<Seat>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM seats \
             WHERE session_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY sector_code, row_label, seat_number"
        );
        sqlx::query_as::<_, Seat>(&query)
            .bind(session_id)
            .bind(status.map(SeatStatus::as_str))
            .fetch_all(executor)
            .await
    }

    /// Seats a buyer can claim right now.
    pub async fn list_available(
        executor: impl PgExecutor<'_>,
        session_id: DbId,
    ) -> Result<Vec<Seat>, sqlx::Error> {
        Self::list_by_session(executor, session_id, Some(SeatStatus::Available)).await
    }

    /// Resolve normalised positions to seat rows. Positions that do not
    /// exist in the session are simply absent from the result.
    pub async fn find_by_positions(
        executor: impl PgExecutor<'_>,
        session_id: DbId,
        positions: &[SeatRef],
    ) -> Result<Vec<Seat>, sqlx::Error> {
        let (sectors, rows, numbers) = split_positions(positions);
        let query = format!(
            "SELECT {COLUMNS} FROM seats \
             WHERE session_id = $1 \
               AND (sector_code, row_label, seat_number) IN ( \
                   SELECT * FROM UNNEST($2::text[], $3::text[], $4::int4[])) \
             ORDER BY id"
        );
        sqlx::query_as::<_, Seat>(&query)
            .bind(session_id)
            .bind(&sectors)
            .bind(&rows)
            .bind(&numbers)
            .fetch_all(executor)
            .await
    }

    pub async fn find_by_ids(
        executor: impl PgExecutor<'_>,
        ids: &[DbId],
    ) -> Result<Vec<Seat>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM seats WHERE id = ANY($1) ORDER BY id");
        sqlx::query_as::<_, Seat>(&query)
            .bind(ids)
            .fetch_all(executor)
            .await
    }

    // ── Conditional transitions ──────────────────────────────────────

    /// Move `ids` from `from` to `to`, touching only rows still in `from`.
    ///
    /// Returns the number of rows changed.
    pub async fn transition(
        executor: impl PgExecutor<'_>,
        ids: &[DbId],
        from: SeatStatus,
        to: SeatStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE seats SET status = $3 WHERE id = ANY($1) AND status = $2",
        )
        .bind(ids)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Release seats HELD by an expired hold back to AVAILABLE.
    ///
    /// A seat is skipped when any other live claim still references it: an
    /// ACTIVE unexpired hold, or a PENDING_PAYMENT order whose hold window is
    /// still open, or a PAID order.
    pub async fn release_for_hold(
        executor: impl PgExecutor<'_>,
        hold_id: DbId,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE seats s SET status = $3 \
             WHERE s.status = $4 \
               AND s.id IN (SELECT seat_id FROM hold_seats WHERE hold_id = $1) \
               AND NOT EXISTS ( \
                   SELECT 1 FROM hold_seats hs JOIN holds h ON h.id = hs.hold_id \
                   WHERE hs.seat_id = s.id AND h.id <> $1 \
                     AND h.status = $5 AND h.expires_at > $2) \
               AND NOT EXISTS ( \
                   SELECT 1 FROM order_items oi JOIN orders o ON o.id = oi.order_id \
                   WHERE oi.seat_id = s.id \
                     AND ((o.status = $6 AND o.hold_expires_at > $2) OR o.status = $7))",
        )
        .bind(hold_id)
        .bind(now)
        .bind(SeatStatus::Available.as_str())
        .bind(SeatStatus::Held.as_str())
        .bind(HoldStatus::Active.as_str())
        .bind(OrderStatus::PendingPayment.as_str())
        .bind(OrderStatus::Paid.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Move every seat of an order from `from` to `to`.
    pub async fn transition_for_order(
        executor: impl PgExecutor<'_>,
        order_id: DbId,
        from: SeatStatus,
        to: SeatStatus,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE seats SET status = $3 \
             WHERE status = $2 \
               AND id IN (SELECT seat_id FROM order_items WHERE order_id = $1)",
        )
        .bind(order_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}

fn split_positions(positions: &[SeatRef]) -> (Vec<String>, Vec<String>, Vec<i32>) {
    let mut sectors = Vec::with_capacity(positions.len());
    let mut rows = Vec::with_capacity(positions.len());
    let mut numbers = Vec::with_capacity(positions.len());
    for p in positions {
        let p = p.normalized();
        sectors.push(p.sector);
        rows.push(p.row);
        numbers.push(p.number);
    }
    (sectors, rows, numbers)
}
