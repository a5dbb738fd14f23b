//! Job entity model
//!
//! SeaORM entity for the `jobs` table. Each row is one shipment record.
//! Party fields are display strings, quantities are kept as entered, and the
//! secondary dates (`hbl_date`, `mbl_date`, `eta_pod`) are stored as ISO strings.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-readable number, `<PREFIX>-<N>/<YY-YY>`; assigned once on create
    #[sea_orm(unique)]
    pub job_number: String,

    pub status: String,
    pub shipment_type: String,
    pub mode: String,
    pub rm_name: Option<String>,
    pub shipper_details: String,
    pub consignee_details: String,
    pub overseas_agent: Option<String>,
    pub booking_number: Option<String>,
    pub invoice_number: Option<String>,
    pub port_of_loading: Option<String>,
    pub final_destination: Option<String>,
    pub commodity: Option<String>,
    pub gross_weight: Option<String>,
    pub net_weight: Option<String>,
    pub no_of_packages: Option<String>,
    pub volume: Option<String>,
    pub hbl_number: Option<String>,
    pub hbl_date: Option<String>,
    pub mbl_number: Option<String>,
    pub mbl_date: Option<String>,
    pub eta_pod: Option<String>,

    /// Ordered JSON array of container or flight numbers
    #[sea_orm(column_type = "Json")]
    pub container_flight_numbers: JsonValue,

    pub remarks: Option<String>,

    /// Uid of the session that created the job
    pub created_by: String,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
