//! User profile entity model
//!
//! The authoritative role and permission map for an authenticated uid.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_profiles")]
pub struct Model {
    /// Identity provider uid (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,

    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    /// `superadmin` or `rms`
    pub role: String,

    /// JSON object of capability name to boolean
    #[sea_orm(column_type = "Json")]
    pub permissions: JsonValue,

    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
