//! Provider account entity model
//!
//! Email/password credentials owned by the built-in identity provider.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "provider_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uid: String,

    /// Lowercased sign-in email
    #[sea_orm(unique)]
    pub email: String,

    /// `hmac-sha256$<salt>$<hex digest>`
    pub password_hash: String,

    pub disabled: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
