//! Migration: Create enterprises table

use sea_orm_migration::prelude::*;

use super::m20260720_000001_create_deployments::Deployments;
use super::m20260720_000002_create_subscriptions::Subscriptions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Enterprises::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enterprises::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Enterprises::BusinessName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Enterprises::BusinessAddress).string().null())
                    .col(
                        ColumnDef::new(Enterprises::BusinessIndustry)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Enterprises::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Enterprises::HashedPassword)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enterprises::DeploymentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enterprises::SubscriptionId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enterprises::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Enterprises::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enterprises_deployment")
                            .from(Enterprises::Table, Enterprises::DeploymentId)
                            .to(Deployments::Table, Deployments::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enterprises_subscription")
                            .from(Enterprises::Table, Enterprises::SubscriptionId)
                            .to(Subscriptions::Table, Subscriptions::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_enterprises_email")
                    .table(Enterprises::Table)
                    .col(Enterprises::Email)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(Enterprises::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
pub enum Enterprises {
    Table,
    Id,
    #[iden = "business_name"]
    BusinessName,
    #[iden = "business_address"]
    BusinessAddress,
    #[iden = "business_industry"]
    BusinessIndustry,
    Email,
    #[iden = "hashed_password"]
    HashedPassword,
    #[iden = "deployment_id"]
    DeploymentId,
    #[iden = "subscription_id"]
    SubscriptionId,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}
