//! # RM Directory Repository
//!
//! Lookup and bookkeeping for short-code logins. Codes are stored and looked
//! up in lowercase.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use crate::error::RepositoryError;
use crate::models::rm_directory::{ActiveModel, Entity as RmDirectory, Model};

#[derive(Debug, Clone)]
pub struct NewDirectoryEntry {
    pub code: String,
    pub uid: String,
    pub password: String,
    pub status: String,
    pub display_name: Option<String>,
}

pub struct DirectoryRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> DirectoryRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Exact match on the lowercased code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Model>, RepositoryError> {
        RmDirectory::find_by_id(code.to_lowercase())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn record_login(&self, code: &str, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let active = ActiveModel {
            code: Set(code.to_lowercase()),
            last_login_at: Set(Some(at.fixed_offset())),
            ..Default::default()
        };

        active
            .update(self.db)
            .await
            .map(|_| ())
            .map_err(RepositoryError::database_error)
    }

    pub async fn create(&self, entry: NewDirectoryEntry) -> Result<Model, RepositoryError> {
        ActiveModel {
            code: Set(entry.code.trim().to_lowercase()),
            uid: Set(entry.uid),
            password: Set(entry.password),
            status: Set(entry.status),
            display_name: Set(entry.display_name),
            last_login_at: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }
}
