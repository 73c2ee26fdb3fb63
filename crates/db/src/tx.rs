//! Transaction helpers and datastore error classification.
//!
//! Use cases open their own transactions with the isolation level they need
//! and translate the two expected failure shapes (serialization failures and
//! unique-constraint races) into domain outcomes.

use sqlx::{PgPool, Postgres, Transaction};

/// SQLSTATE for `serialization_failure`.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE for `deadlock_detected`.
pub const DEADLOCK_DETECTED: &str = "40P01";

/// SQLSTATE for `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Begin a transaction at the default (read committed) isolation level.
pub async fn begin(pool: &PgPool) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    pool.begin().await
}

/// Begin a transaction at SERIALIZABLE isolation.
///
/// `SET TRANSACTION` must be the first statement of the transaction, so it
/// is issued immediately after `BEGIN`.
pub async fn begin_serializable(
    pool: &PgPool,
) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
        .execute(&mut *tx)
        .await?;
    Ok(tx)
}

fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|c| c.into_owned()),
        _ => None,
    }
}

/// True when the database aborted the transaction to preserve serializability
/// (or broke a deadlock). The whole transaction may be retried.
pub fn is_serialization_failure(err: &sqlx::Error) -> bool {
    matches!(
        sqlstate(err).as_deref(),
        Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
    )
}

/// If `err` is a unique violation, the name of the violated constraint.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            Some(db_err.constraint().unwrap_or("unknown").to_string())
        }
        _ => None,
    }
}

/// True when `err` violated exactly the named unique constraint.
pub fn is_unique_violation_on(err: &sqlx::Error, constraint: &str) -> bool {
    unique_violation(err).as_deref() == Some(constraint)
}
