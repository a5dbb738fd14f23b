//! RM directory entity model
//!
//! Short login codes for relationship managers, keyed by lowercase code.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rm_directory")]
pub struct Model {
    /// Lowercase short code (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,

    /// Uid of the profile this code signs in as
    pub uid: String,

    /// Stored secret: plaintext or `hmac-sha256$<salt>$<hex digest>`
    pub password: String,

    /// Sign-in is allowed only when this equals `active` (any case)
    pub status: String,

    pub display_name: Option<String>,
    pub last_login_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
