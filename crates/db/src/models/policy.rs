//! Commercial policy entity model.

use boxoffice_core::pricing::FeePolicy;
use boxoffice_core::types::{Cents, DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `commercial_policies` table (one per tenant).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommercialPolicy {
    pub id: DbId,
    pub tenant_id: DbId,
    pub service_fee_percent_bps: i32,
    pub service_fee_fixed_cents: Cents,
    pub version: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CommercialPolicy {
    pub fn fee_policy(&self) -> FeePolicy {
        FeePolicy {
            service_fee_percent_bps: self.service_fee_percent_bps,
            service_fee_fixed_cents: self.service_fee_fixed_cents,
            version: self.version.clone(),
        }
    }
}
