//! Counterparty entity model
//!
//! Shippers, consignees and overseas agents share one table, discriminated by
//! `kind`.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "counterparties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// `shipper`, `consignee` or `overseas-agent`
    pub kind: String,

    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,

    /// Location of the attached document in blob storage
    pub document_url: Option<String>,

    /// Original filename of the attached document
    pub document_name: Option<String>,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
