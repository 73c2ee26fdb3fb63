//! Repository for the `refunds` table.

use boxoffice_core::status::RefundStatus;
use boxoffice_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::payment::{NewRefund, Refund};

/// One refund per order.
pub const UQ_REFUNDS_ORDER_ID: &str = "uq_refunds_order_id";

const COLUMNS: &str =
    "id, order_id, payment_id, amount_cents, status, reason_code, actor_id, created_at";

pub struct RefundRepo;

impl RefundRepo {
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &NewRefund,
    ) -> Result<Refund, sqlx::Error> {
        let query = format!(
            "INSERT INTO refunds (order_id, payment_id, amount_cents, status, reason_code, actor_id) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Refund>(&query)
            .bind(input.order_id)
            .bind(input.payment_id)
            .bind(input.amount_cents)
            .bind(RefundStatus::Approved.as_str())
            .bind(&input.reason_code)
            .bind(input.actor_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_order(
        executor: impl PgExecutor<'_>,
        order_id: DbId,
    ) -> Result<Option<Refund>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM refunds WHERE order_id = $1");
        sqlx::query_as::<_, Refund>(&query)
            .bind(order_id)
            .fetch_optional(executor)
            .await
    }
}
