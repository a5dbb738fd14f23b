//! # Activity Log Repository

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::activity_log::{ActiveModel, Column, Entity as ActivityLog, Model};

pub struct ActivityRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ActivityRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn record(
        &self,
        actor_uid: &str,
        action: &str,
        subject_id: &str,
        details: Option<serde_json::Value>,
    ) -> Result<Model, RepositoryError> {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            actor_uid: Set(actor_uid.to_string()),
            action: Set(action.to_string()),
            subject_id: Set(subject_id.to_string()),
            details: Set(details),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    /// Entries about one subject, oldest first.
    pub async fn for_subject(&self, subject_id: &str) -> Result<Vec<Model>, RepositoryError> {
        ActivityLog::find()
            .filter(Column::SubjectId.eq(subject_id))
            .order_by_asc(Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
