//! Migration to create the user_profiles table.
//!
//! Profiles hold the server-resolved role and permission map for every
//! identity that may establish a session.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserProfiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserProfiles::Uid)
                            .text()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserProfiles::Email).text().null())
                    .col(ColumnDef::new(UserProfiles::FirstName).text().null())
                    .col(ColumnDef::new(UserProfiles::LastName).text().null())
                    .col(
                        ColumnDef::new(UserProfiles::Role)
                            .text()
                            .not_null()
                            .default("rms"),
                    )
                    .col(ColumnDef::new(UserProfiles::Permissions).json().not_null())
                    .col(
                        ColumnDef::new(UserProfiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(UserProfiles::UpdatedAt)
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
            .drop_table(Table::drop().table(UserProfiles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum UserProfiles {
    Table,
    Uid,
    Email,
    FirstName,
    LastName,
    Role,
    Permissions,
    CreatedAt,
    UpdatedAt,
}
