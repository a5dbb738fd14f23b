//! Migration to create the jobs table.
//!
//! Jobs are shipment records. Party fields are stored as display strings,
//! numeric quantities as text, and secondary dates as ISO strings.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Jobs::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Jobs::JobNumber)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Jobs::Status)
                            .text()
                            .not_null()
                            .default("Pending"),
                    )
                    .col(ColumnDef::new(Jobs::ShipmentType).text().not_null())
                    .col(ColumnDef::new(Jobs::Mode).text().not_null())
                    .col(ColumnDef::new(Jobs::RmName).text().null())
                    .col(ColumnDef::new(Jobs::ShipperDetails).text().not_null())
                    .col(ColumnDef::new(Jobs::ConsigneeDetails).text().not_null())
                    .col(ColumnDef::new(Jobs::OverseasAgent).text().null())
                    .col(ColumnDef::new(Jobs::BookingNumber).text().null())
                    .col(ColumnDef::new(Jobs::InvoiceNumber).text().null())
                    .col(ColumnDef::new(Jobs::PortOfLoading).text().null())
                    .col(ColumnDef::new(Jobs::FinalDestination).text().null())
                    .col(ColumnDef::new(Jobs::Commodity).text().null())
                    .col(ColumnDef::new(Jobs::GrossWeight).text().null())
                    .col(ColumnDef::new(Jobs::NetWeight).text().null())
                    .col(ColumnDef::new(Jobs::NoOfPackages).text().null())
                    .col(ColumnDef::new(Jobs::Volume).text().null())
                    .col(ColumnDef::new(Jobs::HblNumber).text().null())
                    .col(ColumnDef::new(Jobs::HblDate).text().null())
                    .col(ColumnDef::new(Jobs::MblNumber).text().null())
                    .col(ColumnDef::new(Jobs::MblDate).text().null())
                    .col(ColumnDef::new(Jobs::EtaPod).text().null())
                    .col(
                        ColumnDef::new(Jobs::ContainerFlightNumbers)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Jobs::Remarks).text().null())
                    .col(ColumnDef::new(Jobs::CreatedBy).text().not_null())
                    .col(
                        ColumnDef::new(Jobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Jobs::UpdatedAt)
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
                    .name("idx_jobs_created_at")
                    .table(Jobs::Table)
                    .col(Jobs::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
    JobNumber,
    Status,
    ShipmentType,
    Mode,
    RmName,
    ShipperDetails,
    ConsigneeDetails,
    OverseasAgent,
    BookingNumber,
    InvoiceNumber,
    PortOfLoading,
    FinalDestination,
    Commodity,
    GrossWeight,
    NetWeight,
    NoOfPackages,
    Volume,
    HblNumber,
    HblDate,
    MblNumber,
    MblDate,
    EtaPod,
    ContainerFlightNumbers,
    Remarks,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}
