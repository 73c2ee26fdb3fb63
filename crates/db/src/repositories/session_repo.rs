//! Repository for the `events` and `sessions` tables.

use boxoffice_core::status::{EventStatus, SessionStatus};
use boxoffice_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::session::{CreateEvent, CreateSession, Event, SaleContext, Session};

const EVENT_COLUMNS: &str = "id, tenant_id, name, status, created_at, updated_at";

const SESSION_COLUMNS: &str =
    "id, event_id, starts_at, status, price_cents, currency_code, created_at, updated_at";

/// Reads sale gating data; writes exist for seeding.
pub struct SessionRepo;

impl SessionRepo {
    pub async fn create_event(
        executor: impl PgExecutor<'_>,
        input: &CreateEvent,
    ) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events (tenant_id, name, status) VALUES ($1, $2, $3) \
             RETURNING {EVENT_COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(input.tenant_id)
            .bind(&input.name)
            .bind(input.status.as_str())
            .fetch_one(executor)
            .await
    }

    pub async fn create_session(
        executor: impl PgExecutor<'_>,
        input: &CreateSession,
    ) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (event_id, starts_at, status, price_cents, currency_code) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.event_id)
            .bind(input.starts_at)
            .bind(input.status.as_str())
            .bind(input.price_cents)
            .bind(&input.currency_code)
            .fetch_one(executor)
            .await
    }

    pub async fn find_session(
        executor: impl PgExecutor<'_>,
        id: DbId,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Load the session together with its event's tenant and status.
    pub async fn find_sale_context(
        executor: impl PgExecutor<'_>,
        session_id: DbId,
    ) -> Result<Option<SaleContext>, sqlx::Error> {
        sqlx::query_as::<_, SaleContext>(
            "SELECT s.id AS session_id, e.id AS event_id, e.tenant_id, \
                    s.status AS session_status, e.status AS event_status, \
                    s.price_cents, s.currency_code \
             FROM sessions s JOIN events e ON e.id = s.event_id \
             WHERE s.id = $1",
        )
        .bind(session_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn set_session_status(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: SessionStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE sessions SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_event_status(
        executor: impl PgExecutor<'_>,
        id: DbId,
        status: EventStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE events SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
