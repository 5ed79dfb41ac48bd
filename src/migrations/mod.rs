pub use sea_orm_migration::prelude::*;

mod m20260720_000001_create_deployments;
mod m20260720_000002_create_subscriptions;
mod m20260720_000003_create_enterprises;
mod m20260720_000004_create_sequence_counters;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260720_000001_create_deployments::Migration),
            Box::new(m20260720_000002_create_subscriptions::Migration),
            Box::new(m20260720_000003_create_enterprises::Migration),
            Box::new(m20260720_000004_create_sequence_counters::Migration),
        ]
    }
}
