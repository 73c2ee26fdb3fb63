//! Repository for the `orders` and `order_items` tables.

use boxoffice_core::status::OrderStatus;
use boxoffice_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgExecutor};

use crate::models::order::{NewOrder, NewOrderItem, Order, OrderItem};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tenant_id, session_id, hold_id, idempotency_key, request_hash, \
    status, buyer_name, buyer_email, buyer_document, ticket_subtotal_cents, service_fee_cents, \
    total_amount_cents, currency_code, hold_expires_at, commercial_policy_version, paid_at, \
    created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, seat_id, sector_code, row_label, seat_number, \
    unit_price_cents, created_at";

/// Unique constraint guarding one order per hold.
pub const UQ_ORDERS_HOLD_ID: &str = "uq_orders_hold_id";

/// Unique constraint guarding one order per idempotency key.
pub const UQ_ORDERS_IDEMPOTENCY_KEY: &str = "uq_orders_idempotency_key";

pub struct OrderRepo;

impl OrderRepo {
    /// Insert an order in PENDING_PAYMENT together with its items.
    ///
    /// Unique violations on [`UQ_ORDERS_HOLD_ID`] or
    /// [`UQ_ORDERS_IDEMPOTENCY_KEY`] are returned as-is for the caller to
    /// resolve.
    pub async fn create_with_items(
        conn: &mut PgConnection,
        input: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<(Order, Vec<OrderItem>), sqlx::Error> {
        let query = format!(
            "INSERT INTO orders \
                (tenant_id, session_id, hold_id, idempotency_key, request_hash, status, \
                 buyer_name, buyer_email, buyer_document, ticket_subtotal_cents, \
                 service_fee_cents, total_amount_cents, currency_code, hold_expires_at, \
                 commercial_policy_version) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(input.tenant_id)
            .bind(input.session_id)
            .bind(input.hold_id)
            .bind(&input.idempotency_key)
            .bind(&input.request_hash)
            .bind(OrderStatus::PendingPayment.as_str())
            .bind(&input.buyer_name)
            .bind(&input.buyer_email)
            .bind(&input.buyer_document)
            .bind(input.ticket_subtotal_cents)
            .bind(input.service_fee_cents)
            .bind(input.total_amount_cents)
            .bind(&input.currency_code)
            .bind(input.hold_expires_at)
            .bind(&input.commercial_policy_version)
            .fetch_one(&mut *conn)
            .await?;

        let seat_ids: Vec<DbId> = items.iter().map(|i| i.seat_id).collect();
        let sectors: Vec<&str> = items.iter().map(|i| i.sector_code.as_str()).collect();
        let rows: Vec<&str> = items.iter().map(|i| i.row_label.as_str()).collect();
        let numbers: Vec<i32> = items.iter().map(|i| i.seat_number).collect();
        let prices: Vec<i64> = items.iter().map(|i| i.unit_price_cents).collect();

        let item_query = format!(
            "INSERT INTO order_items \
                (order_id, seat_id, sector_code, row_label, seat_number, unit_price_cents) \
             SELECT $1, seat_id, sector_code, row_label, seat_number, unit_price_cents \
             FROM UNNEST($2::bigint[], $3::text[], $4::text[], $5::int4[], $6::bigint[]) \
                  AS i(seat_id, sector_code, row_label, seat_number, unit_price_cents) \
             RETURNING {ITEM_COLUMNS}"
        );
        let mut created = sqlx::query_as::<_, OrderItem>(&item_query)
            .bind(order.id)
            .bind(&seat_ids)
            .bind(&sectors)
            .bind(&rows)
            .bind(&numbers)
            .bind(&prices)
            .fetch_all(&mut *conn)
            .await?;
        created.sort_by_key(|i| i.id);

        Ok((order, created))
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_idempotency_key(
        executor: impl PgExecutor<'_>,
        key: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE idempotency_key = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(key)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_hold_id(
        executor: impl PgExecutor<'_>,
        hold_id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE hold_id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(hold_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_items(
        executor: impl PgExecutor<'_>,
        order_id: DbId,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        let query = format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, OrderItem>(&query)
            .bind(order_id)
            .fetch_all(executor)
            .await
    }

    /// Conditionally move an order from `from` to `to`.
    pub async fn transition(
        executor: impl PgExecutor<'_>,
        id: DbId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// PENDING_PAYMENT -> PAID, stamping `paid_at`. Returns `None` when the
    /// order was no longer pending (a concurrent approval won).
    pub async fn mark_paid(
        executor: impl PgExecutor<'_>,
        id: DbId,
        paid_at: Timestamp,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = $3, paid_at = $2 WHERE id = $1 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(paid_at)
            .bind(OrderStatus::Paid.as_str())
            .bind(OrderStatus::PendingPayment.as_str())
            .fetch_optional(executor)
            .await
    }

    /// PENDING_PAYMENT -> EXPIRED, only once the copied hold window closed.
    pub async fn expire_if_lapsed(
        executor: impl PgExecutor<'_>,
        id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders SET status = $3 \
             WHERE id = $1 AND status = $4 AND hold_expires_at <= $2",
        )
        .bind(id)
        .bind(now)
        .bind(OrderStatus::Expired.as_str())
        .bind(OrderStatus::PendingPayment.as_str())
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// PENDING_PAYMENT orders past their hold window that include any of
    /// `seat_ids`.
    pub async fn find_lapsed_for_seats(
        executor: impl PgExecutor<'_>,
        seat_ids: &[DbId],
        now: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT DISTINCT o.id FROM orders o JOIN order_items oi ON oi.order_id = o.id \
             WHERE oi.seat_id = ANY($1) AND o.status = $2 AND o.hold_expires_at <= $3 \
             ORDER BY o.id",
        )
        .bind(seat_ids)
        .bind(OrderStatus::PendingPayment.as_str())
        .bind(now)
        .fetch_all(executor)
        .await
    }
}
