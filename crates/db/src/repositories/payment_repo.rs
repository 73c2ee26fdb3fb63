//! Repository for the `payments` table.

use boxoffice_core::status::PaymentStatus;
use boxoffice_core::types::{DbId, Timestamp};
use sqlx::PgExecutor;

use crate::models::payment::{NewPayment, Payment};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, order_id, idempotency_key, request_hash, method, provider, \
    provider_payment_id, status, amount_cents, provider_payload, approved_at, \
    created_at, updated_at";

/// Unique constraint guarding one payment per idempotency key.
pub const UQ_PAYMENTS_IDEMPOTENCY_KEY: &str = "uq_payments_idempotency_key";

/// Partial unique index allowing a single APPROVED payment per order.
pub const UQ_PAYMENTS_ONE_APPROVED_PER_ORDER: &str = "uq_payments_one_approved_per_order";

pub struct PaymentRepo;

impl PaymentRepo {
    /// Claim an idempotency key with a PENDING payment row before the
    /// gateway is contacted.
    pub async fn insert_pending(
        executor: impl PgExecutor<'_>,
        input: &NewPayment,
    ) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments (order_id, idempotency_key, request_hash, method, status, amount_cents) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(input.order_id)
            .bind(&input.idempotency_key)
            .bind(&input.request_hash)
            .bind(&input.method)
            .bind(PaymentStatus::Pending.as_str())
            .bind(input.amount_cents)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    pub async fn find_by_idempotency_key(
        executor: impl PgExecutor<'_>,
        key: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE idempotency_key = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(key)
            .fetch_optional(executor)
            .await
    }

    /// Lock the payment row a provider callback refers to.
    pub async fn find_by_provider_payment_id_for_update(
        executor: impl PgExecutor<'_>,
        provider_payment_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE provider_payment_id = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(provider_payment_id)
            .fetch_optional(executor)
            .await
    }

    pub async fn list_by_order(
        executor: impl PgExecutor<'_>,
        order_id: DbId,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE order_id = $1 ORDER BY id");
        sqlx::query_as::<_, Payment>(&query)
            .bind(order_id)
            .fetch_all(executor)
            .await
    }

    /// Number of attempts recorded against an order, in any status.
    pub async fn count_by_order(
        executor: impl PgExecutor<'_>,
        order_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payments WHERE order_id = $1")
            .bind(order_id)
            .fetch_one(executor)
            .await
    }

    /// The order's APPROVED payment, if any.
    pub async fn find_approved_for_order(
        executor: impl PgExecutor<'_>,
        order_id: DbId,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE order_id = $1 AND status = $2 FOR UPDATE"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(order_id)
            .bind(PaymentStatus::Approved.as_str())
            .fetch_optional(executor)
            .await
    }

    /// Record the provider's reference and raw payload on a PENDING row.
    /// The status itself stays PENDING; settlement is a separate transition.
    pub async fn record_provider_reference(
        executor: impl PgExecutor<'_>,
        id: DbId,
        provider: &str,
        provider_payment_id: &str,
        payload: &serde_json::Value,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET provider = $2, provider_payment_id = $3, provider_payload = $4 \
             WHERE id = $1 AND status = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(provider)
            .bind(provider_payment_id)
            .bind(payload)
            .bind(PaymentStatus::Pending.as_str())
            .fetch_optional(executor)
            .await
    }

    /// Conditionally move a payment from `from` to `to`. An approval stamps
    /// `approved_at`. Returns the updated row when this call won the race.
    pub async fn transition(
        executor: impl PgExecutor<'_>,
        id: DbId,
        from: PaymentStatus,
        to: PaymentStatus,
        now: Timestamp,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET status = $3, \
                 approved_at = CASE WHEN $3 = 'APPROVED' THEN $4 ELSE approved_at END \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .bind(now)
            .fetch_optional(executor)
            .await
    }
}
