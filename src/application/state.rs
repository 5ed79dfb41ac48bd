use sea_orm::DatabaseConnection;

use crate::services::management::ManagementClient;
use crate::services::monitor::InstanceMonitor;
use crate::services::payments::PaymentsClient;

/// Database connection type alias
pub type DbConn = DatabaseConnection;

/// Application state containing all shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DbConn,
    pub management: ManagementClient,
    pub payments: PaymentsClient,
    pub monitor: InstanceMonitor,
}

impl AppState {
    pub fn new(
        db: DbConn,
        management: ManagementClient,
        payments: PaymentsClient,
        monitor: InstanceMonitor,
    ) -> Self {
        Self {
            db,
            management,
            payments,
            monitor,
        }
    }
}
