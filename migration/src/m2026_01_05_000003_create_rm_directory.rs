//! Migration to create the rm_directory table.
//!
//! The directory maps short login codes used by relationship managers to the
//! uid of their profile, along with the account status and last-login marker.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RmDirectory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RmDirectory::Code)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RmDirectory::Uid).text().not_null())
                    .col(ColumnDef::new(RmDirectory::Password).text().not_null())
                    .col(
                        ColumnDef::new(RmDirectory::Status)
                            .text()
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(RmDirectory::DisplayName).text().null())
                    .col(
                        ColumnDef::new(RmDirectory::LastLoginAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(RmDirectory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RmDirectory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum RmDirectory {
    Table,
    Code,
    Uid,
    Password,
    Status,
    DisplayName,
    LastLoginAt,
    CreatedAt,
}
