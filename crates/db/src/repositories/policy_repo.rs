//! Repository for the `commercial_policies` table.

use boxoffice_core::pricing::FeePolicy;
use boxoffice_core::types::DbId;
use sqlx::PgPool;

use crate::models::policy::CommercialPolicy;

const COLUMNS: &str = "id, tenant_id, service_fee_percent_bps, service_fee_fixed_cents, \
    version, created_at, updated_at";

pub struct CommercialPolicyRepo;

impl CommercialPolicyRepo {
    pub async fn find_by_tenant(
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<Option<CommercialPolicy>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM commercial_policies WHERE tenant_id = $1");
        sqlx::query_as::<_, CommercialPolicy>(&query)
            .bind(tenant_id)
            .fetch_optional(pool)
            .await
    }

    /// Return the tenant's policy, inserting the platform default first if
    /// none exists. Concurrent first calls converge on a single row.
    pub async fn ensure_default(
        pool: &PgPool,
        tenant_id: DbId,
    ) -> Result<CommercialPolicy, sqlx::Error> {
        let defaults = FeePolicy::platform_default();
        sqlx::query(
            "INSERT INTO commercial_policies \
                (tenant_id, service_fee_percent_bps, service_fee_fixed_cents, version) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT uq_commercial_policies_tenant DO NOTHING",
        )
        .bind(tenant_id)
        .bind(defaults.service_fee_percent_bps)
        .bind(defaults.service_fee_fixed_cents)
        .bind(&defaults.version)
        .execute(pool)
        .await?;

        let query = format!("SELECT {COLUMNS} FROM commercial_policies WHERE tenant_id = $1");
        sqlx::query_as::<_, CommercialPolicy>(&query)
            .bind(tenant_id)
            .fetch_one(pool)
            .await
    }

    /// Create or replace a tenant's policy.
    pub async fn upsert(
        pool: &PgPool,
        tenant_id: DbId,
        policy: &FeePolicy,
    ) -> Result<CommercialPolicy, sqlx::Error> {
        let query = format!(
            "INSERT INTO commercial_policies \
                (tenant_id, service_fee_percent_bps, service_fee_fixed_cents, version) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT ON CONSTRAINT uq_commercial_policies_tenant DO UPDATE SET \
                service_fee_percent_bps = EXCLUDED.service_fee_percent_bps, \
                service_fee_fixed_cents = EXCLUDED.service_fee_fixed_cents, \
                version = EXCLUDED.version \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CommercialPolicy>(&query)
            .bind(tenant_id)
            .bind(policy.service_fee_percent_bps)
            .bind(policy.service_fee_fixed_cents)
            .bind(&policy.version)
            .fetch_one(pool)
            .await
    }
}
