//! Test helpers and utilities for unit testing.
//!
//! Provides an in-memory database with the full schema applied, plus factory
//! functions for the records most tests need.

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::migrations::Migrator;

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    // Single connection so every task in a test sees the same in-memory
    // database and writes serialize at the pool.
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to create test database");

    // Run migrations using the Migrator
    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Create a test enterprise with its deployment and subscription records.
/// Ports come from the real allocator so uniqueness invariants hold.
pub async fn create_test_enterprise(
    db: &DatabaseConnection,
    business_name: &str,
    email: &str,
    password: &str,
) -> crate::models::enterprise::Model {
    use crate::models::{deployment, enterprise, subscription};
    use crate::services::monitor::InstanceStatus;
    use crate::services::ports;
    use crate::services::security::hash_password;
    use sea_orm::{ActiveModelTrait, Set};

    let app_port = ports::next_app_port(db).await.unwrap();
    let db_port = ports::next_db_port(db).await.unwrap();

    let new_deployment = deployment::ActiveModel {
        app_port: Set(app_port as i32),
        db_port: Set(db_port as i32),
        status: Set(InstanceStatus::Stopped.as_str().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let new_subscription = subscription::ActiveModel {
        status: Set(subscription::STATUS_PENDING.to_string()),
        preapproval_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    let now = chrono::Utc::now();
    let new_enterprise = enterprise::ActiveModel {
        business_name: Set(business_name.to_string()),
        business_address: Set(None),
        business_industry: Set(None),
        email: Set(email.to_string()),
        hashed_password: Set(hash_password(password).unwrap()),
        deployment_id: Set(new_deployment.id),
        subscription_id: Set(new_subscription.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    new_enterprise.insert(db).await.unwrap()
}
