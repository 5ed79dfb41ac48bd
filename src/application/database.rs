//! Database connection handling
//!
//! Connects using the configured URL and runs pending migrations on startup.

use anyhow::Context;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use crate::config::CONFIG;
use crate::migrations::Migrator;

/// Connect to the database and bring the schema up to date.
pub async fn connect() -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(CONFIG.database.url.clone());
    options.sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to {}", CONFIG.database.url))?;

    Migrator::up(&db, None)
        .await
        .context("failed to run database migrations")?;

    Ok(db)
}
