//! Audit log entity model. Audit rows are immutable (no `updated_at`).

use boxoffice_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `audit_logs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub tenant_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<DbId>,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for appending an audit entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuditLog {
    pub tenant_id: Option<DbId>,
    pub actor_id: Option<DbId>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<DbId>,
    pub metadata: serde_json::Value,
}

impl CreateAuditLog {
    pub fn new(action: &str, resource_type: &str, resource_id: DbId) -> Self {
        Self {
            tenant_id: None,
            actor_id: None,
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: Some(resource_id),
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn tenant(mut self, tenant_id: DbId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn actor(mut self, actor_id: Option<DbId>) -> Self {
        self.actor_id = actor_id;
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}
