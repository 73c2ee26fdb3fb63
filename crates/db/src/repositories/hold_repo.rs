//! Repository for the `holds` and `hold_seats` tables.

use boxoffice_core::status::HoldStatus;
use boxoffice_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor};

use crate::models::hold::Hold;
use crate::models::seat::Seat;

const COLUMNS: &str = "id, session_id, status, expires_at, created_at, updated_at";

/// Time-bounded seat claims.
pub struct HoldRepo;

impl HoldRepo {
    /// Insert an ACTIVE hold and link it to `seat_ids`.
    pub async fn create(
        conn: &mut PgConnection,
        session_id: DbId,
        expires_at: Timestamp,
        seat_ids: &[DbId],
    ) -> Result<Hold, sqlx::Error> {
        let query = format!(
            "INSERT INTO holds (session_id, status, expires_at) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let hold = sqlx::query_as::<_, Hold>(&query)
            .bind(session_id)
            .bind(HoldStatus::Active.as_str())
            .bind(expires_at)
            .fetch_one(&mut *conn)
            .await?;

        sqlx::query(
            "INSERT INTO hold_seats (hold_id, seat_id) SELECT $1, UNNEST($2::bigint[])",
        )
        .bind(hold.id)
        .bind(seat_ids)
        .execute(&mut *conn)
        .await?;

        Ok(hold)
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Hold>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM holds WHERE id = $1");
        sqlx::query_as::<_, Hold>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// The seats linked to a hold, in id order.
    pub async fn list_seats(
        executor: impl PgExecutor<'_>,
        hold_id: DbId,
    ) -> Result<Vec<Seat>, sqlx::Error> {
        sqlx::query_as::<_, Seat>(
            "SELECT s.id, s.session_id, s.sector_code, s.row_label, s.seat_number, \
                    s.status, s.updated_at \
             FROM hold_seats hs JOIN seats s ON s.id = hs.seat_id \
             WHERE hs.hold_id = $1 \
             ORDER BY s.id",
        )
        .bind(hold_id)
        .fetch_all(executor)
        .await
    }

    /// Conditionally move a hold from `from` to `to`. Returns `true` if this
    /// call performed the transition.
    pub async fn transition(
        executor: impl PgExecutor<'_>,
        id: DbId,
        from: HoldStatus,
        to: HoldStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE holds SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip an ACTIVE hold to EXPIRED only if its window has actually closed.
    pub async fn expire_if_lapsed(
        executor: impl PgExecutor<'_>,
        id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE holds SET status = $3 WHERE id = $1 AND status = $4 AND expires_at <= $2",
        )
        .bind(id)
        .bind(now)
        .bind(HoldStatus::Expired.as_str())
        .bind(HoldStatus::Active.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// ACTIVE holds past their window that reference any of `seat_ids`.
    pub async fn find_lapsed_for_seats(
        executor: impl PgExecutor<'_>,
        seat_ids: &[DbId],
        now: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT DISTINCT h.id FROM holds h JOIN hold_seats hs ON hs.hold_id = h.id \
             WHERE hs.seat_id = ANY($1) AND h.status = $2 AND h.expires_at <= $3 \
             ORDER BY h.id",
        )
        .bind(seat_ids)
        .bind(HoldStatus::Active.as_str())
        .bind(now)
        .fetch_all(executor)
        .await
    }
}
