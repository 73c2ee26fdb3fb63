//! Repository for the `tickets` table.

use boxoffice_core::status::TicketStatus;
use boxoffice_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::ticket::{NewTicket, Ticket};

const COLUMNS: &str =
    "id, order_id, order_item_id, seat_id, qr_code, status, used_at, created_at, updated_at";

pub const UQ_TICKETS_QR_CODE: &str = "uq_tickets_qr_code";

pub struct TicketRepo;

impl TicketRepo {
    /// Mint one VALID ticket per order item.
    pub async fn create_many(
        executor: impl PgExecutor<'_>,
        order_id: DbId,
        tickets: &[NewTicket],
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        let item_ids: Vec<DbId> = tickets.iter().map(|t| t.order_item_id).collect();
        let seat_ids: Vec<DbId> = tickets.iter().map(|t| t.seat_id).collect();
        let codes: Vec<&str> = tickets.iter().map(|t| t.qr_code.as_str()).collect();

        let query = format!(
            "INSERT INTO tickets (order_id, order_item_id, seat_id, qr_code, status) \
             SELECT $1, order_item_id, seat_id, qr_code, $5 \
             FROM UNNEST($2::bigint[], $3::bigint[], $4::text[]) \
                  AS t(order_item_id, seat_id, qr_code) \
             RETURNING {COLUMNS}"
        );
        let mut created = sqlx::query_as::<_, Ticket>(&query)
            .bind(order_id)
            .bind(&item_ids)
            .bind(&seat_ids)
            .bind(&codes)
            .bind(TicketStatus::Valid.as_str())
            .fetch_all(executor)
            .await?;
        created.sort_by_key(|t| t.id);
        Ok(created)
    }

    pub async fn list_by_order(
        executor: impl PgExecutor<'_>,
        order_id: DbId,
    ) -> Result<Vec<Ticket>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, Ticket>(&query)
            .bind(order_id)
            .fetch_all(executor)
            .await
    }

    pub async fn find_by_qr_code(
        executor: impl PgExecutor<'_>,
        qr_code: &str,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tickets WHERE qr_code = $1");
        sqlx::query_as::<_, Ticket>(&query)
            .bind(qr_code)
            .fetch_optional(executor)
            .await
    }

    /// VALID -> USED. `None` means the ticket was not VALID at update time.
    pub async fn mark_used(
        executor: impl PgExecutor<'_>,
        id: DbId,
        used_at: Timestamp,
    ) -> Result<Option<Ticket>, sqlx::Error> {
        let query = format!(
            "UPDATE tickets SET status = $3, used_at = $2 WHERE id = $1 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Ticket>(&query)
            .bind(id)
            .bind(used_at)
            .bind(TicketStatus::Used.as_str())
            .bind(TicketStatus::Valid.as_str())
            .fetch_optional(executor)
            .await
    }

    /// Cancel every ticket of an order that is not already cancelled.
    pub async fn cancel_for_order(
        executor: impl PgExecutor<'_>,
        order_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE tickets SET status = $2 WHERE order_id = $1 AND status <> $2",
        )
        .bind(order_id)
        .bind(TicketStatus::Cancelled.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }
}
