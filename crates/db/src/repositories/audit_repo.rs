//! Append-only audit trail.

use boxoffice_core::audit::redact_sensitive_fields;
use boxoffice_core::types::DbId;
use sqlx::PgExecutor;

use crate::models::audit::{AuditLog, CreateAuditLog};

const COLUMNS: &str =
    "id, tenant_id, actor_id, action, resource_type, resource_id, metadata, created_at";

pub struct AuditRepo;

impl AuditRepo {
    /// Append one entry. Sensitive metadata fields are redacted before write.
    pub async fn log(
        executor: impl PgExecutor<'_>,
        input: &CreateAuditLog,
    ) -> Result<AuditLog, sqlx::Error> {
        let metadata = redact_sensitive_fields(&input.metadata);

        let query = format!(
            "INSERT INTO audit_logs (tenant_id, actor_id, action, resource_type, resource_id, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.tenant_id)
            .bind(input.actor_id)
            .bind(&input.action)
            .bind(&input.resource_type)
            .bind(input.resource_id)
            .bind(&metadata)
            .fetch_one(executor)
            .await
    }

    /// Entries for one resource, oldest first.
    pub async fn list_for_resource(
        executor: impl PgExecutor<'_>,
        resource_type: &str,
        resource_id: DbId,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs \
             WHERE resource_type = $1 AND resource_id = $2 \
             ORDER BY id"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(resource_type)
            .bind(resource_id)
            .fetch_all(executor)
            .await
    }
}
