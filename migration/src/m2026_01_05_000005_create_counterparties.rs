//! Migration to create the counterparties table (shippers, consignees, overseas agents).
//!
//! Name uniqueness per kind is checked by the application before insert, so the
//! (kind, name) index is deliberately non-unique.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Counterparties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Counterparties::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Counterparties::Kind).text().not_null())
                    .col(ColumnDef::new(Counterparties::Name).text().not_null())
                    .col(ColumnDef::new(Counterparties::Phone).text().null())
                    .col(ColumnDef::new(Counterparties::Email).text().null())
                    .col(ColumnDef::new(Counterparties::DocumentUrl).text().null())
                    .col(ColumnDef::new(Counterparties::DocumentName).text().null())
                    .col(
                        ColumnDef::new(Counterparties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Counterparties::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_counterparties_kind_name")
                    .table(Counterparties::Table)
                    .col(Counterparties::Kind)
                    .col(Counterparties::Name)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Counterparties::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Counterparties {
    Table,
    Id,
    Kind,
    Name,
    Phone,
    Email,
    DocumentUrl,
    DocumentName,
    CreatedAt,
    UpdatedAt,
}
