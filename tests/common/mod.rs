//! Test helpers and utilities for integration testing.

#![allow(dead_code)]

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use posify::migrations::Migrator;
use posify::services::management::ManagementClient;
use posify::services::monitor::InstanceMonitor;
use posify::services::payments::PaymentsClient;
use posify::state::AppState;

pub const TEST_JWT_SECRET: &str = "posify-integration-test-secret";

/// A local address nothing listens on; used where a client must fail fast.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

/// Point the process-wide config at a deterministic signing secret. Must run
/// before anything dereferences CONFIG.
pub fn init_test_env() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        std::env::set_var("POSIFY_JWT_SECRET", TEST_JWT_SECRET);
    });
}

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> DatabaseConnection {
    // Single connection so every task in a test sees the same in-memory
    // database and writes serialize at the pool.
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("Failed to create test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run test migrations");

    db
}

/// Build an application state whose external clients point nowhere.
pub fn build_app_state(db: DatabaseConnection) -> AppState {
    build_app_state_with(db, UNREACHABLE_URL, UNREACHABLE_URL)
}

/// Build an application state against explicit management/payments endpoints.
pub fn build_app_state_with(
    db: DatabaseConnection,
    management_url: &str,
    payments_url: &str,
) -> AppState {
    init_test_env();

    let management = ManagementClient::with_base_url(management_url);
    let payments = PaymentsClient::with_base_url(payments_url, "test-access-token");
    let monitor = InstanceMonitor::new(management.clone());

    AppState::new(db, management, payments, monitor)
}

/// Create a test enterprise with deployment and subscription records
pub async fn create_test_enterprise(
    db: &DatabaseConnection,
    business_name: &str,
    email: &str,
    password: &str,
) -> posify::models::enterprise::Model {
    use posify::models::{deployment, enterprise, subscription};
    use posify::services::monitor::InstanceStatus;
    use posify::services::ports;
    use posify::services::security::hash_password;
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

/// Mint a bearer token for an enterprise, the way login would
pub fn mint_token(enterprise_id: i64, email: &str) -> String {
    init_test_env();
    posify::services::security::create_access_token(&enterprise_id.to_string(), Some(email), None)
        .unwrap()
}

/// Serve a router on an ephemeral local port; returns its base URL
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}
