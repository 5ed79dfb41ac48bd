//! Periodic task scheduler
//!
//! A simple scheduler for running background tasks at regular intervals.
//! Add new tasks by implementing the `PeriodicTask` trait.

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use super::payments::{PaymentsClient, PREAPPROVAL_AUTHORIZED};

/// Trait for periodic background tasks
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Task name for logging
    fn name(&self) -> &'static str;

    /// How often to run (e.g., every 5 minutes)
    fn interval(&self) -> Duration;

    /// Execute the task
    async fn run(&self, db: &DatabaseConnection) -> anyhow::Result<()>;
}

/// Start all periodic tasks
pub fn start_scheduler(db: Arc<DatabaseConnection>, payments: PaymentsClient) {
    let tasks: Vec<Box<dyn PeriodicTask>> = vec![Box::new(SubscriptionSyncTask { payments })];

    for task in tasks {
        let db = db.clone();
        tokio::spawn(async move {
            run_task(task, db).await;
        });
    }

    tracing::info!("Periodic task scheduler started");
}

/// Run a single task on its interval
async fn run_task(task: Box<dyn PeriodicTask>, db: Arc<DatabaseConnection>) {
    let mut ticker = interval(task.interval());

    // Skip the first immediate tick
    ticker.tick().await;

    loop {
        ticker.tick().await;

        tracing::debug!(task = task.name(), "Running periodic task");

        match task.run(&db).await {
            Ok(()) => {
                tracing::debug!(task = task.name(), "Periodic task completed");
            }
            Err(e) => {
                tracing::error!(task = task.name(), error = %e, "Periodic task failed");
            }
        }
    }
}

// ============================================================================
// Subscription Sync Task
// ============================================================================

use crate::models::prelude::*;
use crate::models::subscription;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

/// Activates pending subscriptions once the payment processor reports their
/// preapproval authorized. This is the asynchronous half of activation; the
/// explicit check endpoint covers the checkout return redirect.
struct SubscriptionSyncTask {
    payments: PaymentsClient,
}

#[async_trait]
impl PeriodicTask for SubscriptionSyncTask {
    fn name(&self) -> &'static str {
        "subscription_sync"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(5 * 60)
    }

    async fn run(&self, db: &DatabaseConnection) -> anyhow::Result<()> {
        let pending = Subscription::find()
            .filter(subscription::Column::Status.eq(subscription::STATUS_PENDING))
            .filter(subscription::Column::PreapprovalId.is_not_null())
            .all(db)
            .await?;

        let mut activated = 0u64;
        for sub in pending {
            let Some(preapproval_id) = sub.preapproval_id.clone() else {
                continue;
            };

            match self.payments.get_preapproval(&preapproval_id).await {
                Ok(preapproval)
                    if preapproval.status.as_deref() == Some(PREAPPROVAL_AUTHORIZED) =>
                {
                    let mut model: subscription::ActiveModel = sub.into();
                    model.status = Set(subscription::STATUS_ACTIVE.to_string());
                    model.update(db).await?;
                    activated += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(preapproval_id, error = %e, "preapproval check failed");
                }
            }
        }

        if activated > 0 {
            tracing::info!(activated, "Activated subscriptions");
        }

        Ok(())
    }
}
