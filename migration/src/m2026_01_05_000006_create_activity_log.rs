//! Migration to create the activity_log table for job and entity audit entries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ActivityLog::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ActivityLog::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ActivityLog::ActorUid).text().not_null())
                    .col(ColumnDef::new(ActivityLog::Action).text().not_null())
                    .col(ColumnDef::new(ActivityLog::SubjectId).text().not_null())
                    .col(ColumnDef::new(ActivityLog::Details).json().null())
                    .col(
                        ColumnDef::new(ActivityLog::CreatedAt)
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
            .drop_table(Table::drop().table(ActivityLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ActivityLog {
    Table,
    Id,
    ActorUid,
    Action,
    SubjectId,
    Details,
    CreatedAt,
}
