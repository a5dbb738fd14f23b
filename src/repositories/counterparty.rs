//! # Counterparty Repository
//!
//! Shippers, consignees and overseas agents. Names are unique per kind; the
//! check is an exact, case-sensitive lookup made before every write rather
//! than a storage constraint.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::domain::{Counterparty, CounterpartyDraft, EntityKind};
use crate::error::RepositoryError;
use crate::models::counterparty::{ActiveModel, Column, Entity as CounterpartyEntity, Model};

fn to_counterparty(model: Model) -> Result<Counterparty, RepositoryError> {
    Counterparty::try_from(model)
        .map_err(|err| RepositoryError::Database(DbErr::Type(err.to_string())))
}

/// Result of an update, with the document that is no longer referenced.
#[derive(Debug, Clone)]
pub struct UpdatedCounterparty {
    pub counterparty: Counterparty,
    pub replaced_document_url: Option<String>,
}

pub struct CounterpartyRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> CounterpartyRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All counterparties of `kind`, sorted by name.
    pub async fn list(&self, kind: EntityKind) -> Result<Vec<Counterparty>, RepositoryError> {
        CounterpartyEntity::find()
            .filter(Column::Kind.eq(kind.as_str()))
            .order_by_asc(Column::Name)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(to_counterparty)
            .collect()
    }

    async fn find_model(&self, kind: EntityKind, id: Uuid) -> Result<Model, RepositoryError> {
        CounterpartyEntity::find_by_id(id)
            .filter(Column::Kind.eq(kind.as_str()))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| {
                RepositoryError::NotFound(format!("No {} with id {id}", kind.label()))
            })
    }

    pub async fn find(&self, kind: EntityKind, id: Uuid) -> Result<Counterparty, RepositoryError> {
        self.find_model(kind, id).await.and_then(to_counterparty)
    }

    /// Whether another record of `kind` already uses `name` exactly.
    pub async fn name_taken(
        &self,
        kind: EntityKind,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, RepositoryError> {
        let mut query = CounterpartyEntity::find()
            .filter(Column::Kind.eq(kind.as_str()))
            .filter(Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(Column::Id.ne(id));
        }

        let count = query
            .count(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(count > 0)
    }

    async fn ensure_name_free(
        &self,
        kind: EntityKind,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), RepositoryError> {
        if self.name_taken(kind, name, exclude).await? {
            return Err(RepositoryError::Conflict(format!(
                "A {} named '{name}' already exists",
                kind.label()
            )));
        }
        Ok(())
    }

    pub async fn create(
        &self,
        kind: EntityKind,
        draft: &CounterpartyDraft,
    ) -> Result<Counterparty, RepositoryError> {
        let draft = draft.validate()?;
        self.ensure_name_free(kind, &draft.name, None).await?;

        let now = Utc::now().fixed_offset();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(kind.as_str().to_string()),
            name: Set(draft.name),
            phone: Set(draft.phone),
            email: Set(draft.email),
            document_url: Set(draft.document_url),
            document_name: Set(draft.document_name),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)?;

        to_counterparty(model)
    }

    /// Replace a record's fields. When the stored document changes or is
    /// removed, the previous URL is handed back so the caller can delete it.
    pub async fn update(
        &self,
        kind: EntityKind,
        id: Uuid,
        draft: &CounterpartyDraft,
    ) -> Result<UpdatedCounterparty, RepositoryError> {
        let draft = draft.validate()?;
        let existing = self.find_model(kind, id).await?;
        self.ensure_name_free(kind, &draft.name, Some(id)).await?;

        let replaced_document_url = existing
            .document_url
            .clone()
            .filter(|old| draft.document_url.as_deref() != Some(old.as_str()));

        let mut active = existing.into_active_model();
        active.name = Set(draft.name);
        active.phone = Set(draft.phone);
        active.email = Set(draft.email);
        active.document_url = Set(draft.document_url);
        active.document_name = Set(draft.document_name);
        active.updated_at = Set(Utc::now().fixed_offset());

        let model = active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(UpdatedCounterparty {
            counterparty: to_counterparty(model)?,
            replaced_document_url,
        })
    }

    /// Delete a record, returning it so its document can be removed.
    pub async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<Counterparty, RepositoryError> {
        let existing = self.find_model(kind, id).await?;
        let snapshot = existing.clone();

        existing
            .delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        to_counterparty(snapshot)
    }
}
