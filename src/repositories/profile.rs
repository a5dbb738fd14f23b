//! # User Profile Repository

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set};

use crate::error::RepositoryError;
use crate::models::user_profile::{ActiveModel, Entity as UserProfile, Model};

/// Fields needed to create or replace a profile.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub uid: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: String,
    pub permissions: serde_json::Value,
}

pub struct ProfileRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find(&self, uid: &str) -> Result<Option<Model>, RepositoryError> {
        UserProfile::find_by_id(uid.to_string())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert the profile, or overwrite role, names and permissions if it exists.
    pub async fn upsert(&self, profile: NewProfile) -> Result<Model, RepositoryError> {
        let now = Utc::now().fixed_offset();

        if let Some(existing) = self.find(&profile.uid).await? {
            let mut active = existing.into_active_model();
            active.email = Set(profile.email);
            active.first_name = Set(profile.first_name);
            active.last_name = Set(profile.last_name);
            active.role = Set(profile.role);
            active.permissions = Set(profile.permissions);
            active.updated_at = Set(now);
            return active
                .update(self.db)
                .await
                .map_err(RepositoryError::database_error);
        }

        ActiveModel {
            uid: Set(profile.uid),
            email: Set(profile.email),
            first_name: Set(profile.first_name),
            last_name: Set(profile.last_name),
            role: Set(profile.role),
            permissions: Set(profile.permissions),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }
}
