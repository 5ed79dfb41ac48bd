//! Persistent sequence counters for tenant port assignment.
//!
//! Every registered business gets a dedicated application port and database
//! port. Both are drawn from named counters in the `sequence_counters` table,
//! so assignments are monotonic and survive restarts.

use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};

use crate::error::{AppError, Result};

pub const APP_PORT_COUNTER: &str = "app_port";
pub const DB_PORT_COUNTER: &str = "db_port";

pub const APP_PORT_START: i64 = 3001;
pub const DB_PORT_START: i64 = 27018;

/// Fetch the next value of a named counter.
///
/// The first call for a name stores and returns `start_value`; every later
/// call increments the stored value and returns the result. The read-modify-
/// write happens inside a single upsert statement, so two concurrent callers
/// can never observe the same value.
pub async fn next_value<C>(db: &C, counter_name: &str, start_value: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    let sql = match backend {
        DatabaseBackend::Postgres => {
            "INSERT INTO sequence_counters (name, value) VALUES ($1, $2) \
             ON CONFLICT (name) DO UPDATE SET value = sequence_counters.value + 1 \
             RETURNING value"
        }
        _ => {
            "INSERT INTO sequence_counters (name, value) VALUES (?, ?) \
             ON CONFLICT (name) DO UPDATE SET value = sequence_counters.value + 1 \
             RETURNING value"
        }
    };

    let row = db
        .query_one(Statement::from_sql_and_values(
            backend,
            sql,
            [counter_name.into(), start_value.into()],
        ))
        .await?
        .ok_or_else(|| {
            AppError::Internal(format!("Counter '{}' returned no value", counter_name))
        })?;

    Ok(row.try_get::<i64>("", "value")?)
}

/// Next application port for a new tenant.
pub async fn next_app_port<C: ConnectionTrait>(db: &C) -> Result<i64> {
    next_value(db, APP_PORT_COUNTER, APP_PORT_START).await
}

/// Next database port for a new tenant.
pub async fn next_db_port<C: ConnectionTrait>(db: &C) -> Result<i64> {
    next_value(db, DB_PORT_COUNTER, DB_PORT_START).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_db;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_first_use_returns_start_value() {
        let db = create_test_db().await;

        assert_eq!(next_app_port(&db).await.unwrap(), 3001);
        assert_eq!(next_db_port(&db).await.unwrap(), 27018);
    }

    #[tokio::test]
    async fn test_subsequent_calls_increment() {
        let db = create_test_db().await;

        assert_eq!(next_app_port(&db).await.unwrap(), 3001);
        assert_eq!(next_app_port(&db).await.unwrap(), 3002);
        assert_eq!(next_app_port(&db).await.unwrap(), 3003);
    }

    #[tokio::test]
    async fn test_counters_are_independent() {
        let db = create_test_db().await;

        assert_eq!(next_app_port(&db).await.unwrap(), 3001);
        assert_eq!(next_db_port(&db).await.unwrap(), 27018);
        assert_eq!(next_app_port(&db).await.unwrap(), 3002);
        assert_eq!(next_db_port(&db).await.unwrap(), 27019);
    }

    #[tokio::test]
    async fn test_concurrent_allocations_are_distinct() {
        let db = Arc::new(create_test_db().await);

        let mut handles = Vec::new();
        for _ in 0..20 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                next_app_port(db.as_ref()).await.unwrap()
            }));
        }

        let mut seen = HashSet::new();
        for handle in handles {
            let port = handle.await.unwrap();
            assert!(seen.insert(port), "port {} was assigned twice", port);
        }
        assert_eq!(seen.len(), 20);
    }
}
