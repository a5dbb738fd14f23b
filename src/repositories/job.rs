//! # Job Repository
//!
//! Persistence for shipment jobs. Listing returns the whole collection; the
//! filter engine, not SQL, decides what is visible.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::domain::{Job, JobDraft, JobStatus, RequiredJobFields, clean_text};
use crate::error::RepositoryError;
use crate::models::job::{ActiveModel, Column, Entity as JobEntity, Model};

fn to_job(model: Model) -> Result<Job, RepositoryError> {
    Job::try_from(model).map_err(|err| RepositoryError::Database(DbErr::Type(err.to_string())))
}

fn container_numbers(draft: &JobDraft) -> serde_json::Value {
    serde_json::Value::from(draft.cleaned_container_numbers())
}

/// Copy the editable draft fields onto an active model.
fn apply_draft(active: &mut ActiveModel, required: RequiredJobFields, draft: &JobDraft) {
    active.shipment_type = Set(required.shipment_type.as_str().to_string());
    active.mode = Set(required.mode.as_str().to_string());
    active.shipper_details = Set(required.shipper_details);
    active.consignee_details = Set(required.consignee_details);
    active.rm_name = Set(clean_text(draft.rm_name.as_deref()));
    active.overseas_agent = Set(clean_text(draft.overseas_agent.as_deref()));
    active.booking_number = Set(clean_text(draft.booking_number.as_deref()));
    active.invoice_number = Set(clean_text(draft.invoice_number.as_deref()));
    active.port_of_loading = Set(clean_text(draft.port_of_loading.as_deref()));
    active.final_destination = Set(clean_text(draft.final_destination.as_deref()));
    active.commodity = Set(clean_text(draft.commodity.as_deref()));
    active.gross_weight = Set(clean_text(draft.gross_weight.as_deref()));
    active.net_weight = Set(clean_text(draft.net_weight.as_deref()));
    active.no_of_packages = Set(clean_text(draft.no_of_packages.as_deref()));
    active.volume = Set(clean_text(draft.volume.as_deref()));
    active.hbl_number = Set(clean_text(draft.hbl_number.as_deref()));
    active.hbl_date = Set(draft.hbl_date.as_ref().map(|date| date.to_raw_string()));
    active.mbl_number = Set(clean_text(draft.mbl_number.as_deref()));
    active.mbl_date = Set(draft.mbl_date.as_ref().map(|date| date.to_raw_string()));
    active.eta_pod = Set(draft.eta_pod.as_ref().map(|date| date.to_raw_string()));
    active.container_flight_numbers = Set(container_numbers(draft));
    active.remarks = Set(clean_text(draft.remarks.as_deref()));
}

pub struct JobRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> JobRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// All jobs, newest first.
    pub async fn list_all(&self) -> Result<Vec<Job>, RepositoryError> {
        JobEntity::find()
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::JobNumber)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .into_iter()
            .map(to_job)
            .collect()
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Job>, RepositoryError> {
        JobEntity::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .map(to_job)
            .transpose()
    }

    /// Every issued job number in the `<prefix>-` family.
    pub async fn job_numbers_with_prefix(&self, prefix: &str) -> Result<Vec<String>, DbErr> {
        JobEntity::find()
            .select_only()
            .column(Column::JobNumber)
            .filter(Column::JobNumber.starts_with(format!("{prefix}-")))
            .into_tuple::<String>()
            .all(self.db)
            .await
    }

    pub async fn create(
        &self,
        required: RequiredJobFields,
        draft: &JobDraft,
        job_number: String,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Result<Job, RepositoryError> {
        let stamp = now.fixed_offset();
        let mut active = ActiveModel {
            id: Set(Uuid::new_v4()),
            job_number: Set(job_number),
            status: Set(draft.status.unwrap_or(JobStatus::Pending).as_str().to_string()),
            created_by: Set(created_by.to_string()),
            created_at: Set(stamp),
            updated_at: Set(stamp),
            ..Default::default()
        };
        apply_draft(&mut active, required, draft);

        let model = active
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        to_job(model)
    }

    /// Replace the editable fields of an existing job. The job number and
    /// creation audit fields are never touched.
    pub async fn update(
        &self,
        id: Uuid,
        required: RequiredJobFields,
        draft: &JobDraft,
        now: DateTime<Utc>,
    ) -> Result<Job, RepositoryError> {
        let existing = JobEntity::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::NotFound(format!("Job {id} not found")))?;

        let mut active = existing.into_active_model();
        if let Some(status) = draft.status {
            active.status = Set(status.as_str().to_string());
        }
        apply_draft(&mut active, required, draft);
        active.updated_at = Set(now.fixed_offset());

        let model = active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        to_job(model)
    }
}
