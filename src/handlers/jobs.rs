//! # Jobs API Handlers
//!
//! Create, edit, list, report on and stream shipment jobs. Listing always
//! loads the whole collection and runs it through the filter engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{
        Json,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::Utc;
use futures_util::{Stream, StreamExt, future, stream};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::BearerToken;
use crate::columns::{ColumnSelection, ReportTable, build_report};
use crate::domain::{Job, JobDraft, clean_text};
use crate::error::{ApiError, not_found, validation_error};
use crate::filter::{JobFilters, apply_filters, extract_unique_values};
use crate::repositories::{ActivityRepository, JobRepository};
use crate::server::AppState;
use crate::session::{Gate, Role, Session, capability};

/// Free-text search parameter
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive substring matched against the searchable job fields
    pub q: Option<String>,
}

/// Report parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportParams {
    /// Comma-separated column keys; blank selects the default columns
    #[param(example = "jobNumber,status,shipperDetails")]
    pub columns: Option<String>,
    /// Free-text search applied before projection
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
    pub total: usize,
}

/// Distinct values per filterable field, sorted
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FilterOptionsResponse {
    pub options: BTreeMap<String, Vec<String>>,
}

/// Inserts tried before a job number collision is reported as 409.
const JOB_NUMBER_ATTEMPTS: u32 = 3;

/// Whether the session may see `job`. RMs without `viewAllJobs` only see
/// their own jobs.
fn in_scope(session: &Session, job: &Job) -> bool {
    session.is_superadmin()
        || session.has_permission(capability::VIEW_ALL_JOBS)
        || job.created_by == session.uid
}

async fn scoped_jobs(state: &AppState, session: &Session) -> Result<Vec<Job>, ApiError> {
    let mut jobs = JobRepository::new(&state.db).list_all().await?;
    jobs.retain(|job| in_scope(session, job));
    Ok(jobs)
}

async fn find_scoped(state: &AppState, session: &Session, id: Uuid) -> Result<Job, ApiError> {
    JobRepository::new(&state.db)
        .find(id)
        .await?
        .filter(|job| in_scope(session, job))
        .ok_or_else(|| not_found(&format!("Job {id} not found")))
}

async fn record_activity(state: &AppState, session: &Session, action: &str, job: &Job) {
    let details = serde_json::json!({ "jobNumber": job.job_number, "status": job.status });
    if let Err(err) = ActivityRepository::new(&state.db)
        .record(&session.uid, action, &job.id.to_string(), Some(details))
        .await
    {
        counter!("jobdesk_secondary_failures_total", "step" => "activity_log").increment(1);
        warn!(job_id = %job.id, action, error = %err, "Failed to write activity log entry");
    }
}

async fn republish(state: &AppState) {
    if let Err(err) = state.feed.refresh(&state.db).await {
        counter!("jobdesk_secondary_failures_total", "step" => "feed_refresh").increment(1);
        warn!(error = %err, "Failed to republish job collection");
    }
}

/// List jobs visible to the session, filtered
#[utoipa::path(
    get,
    path = "/api/v1/jobs",
    security(("bearer_auth" = [])),
    params(SearchParams, JobFilters),
    responses(
        (status = 200, description = "Filtered jobs", body = JobListResponse),
        (status = 400, description = "Invalid query parameters", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    session: Session,
    search: Result<Query<SearchParams>, QueryRejection>,
    filters: Result<Query<JobFilters>, QueryRejection>,
) -> Result<Json<JobListResponse>, ApiError> {
    let Query(search) = search?;
    let Query(filters) = filters?;

    let jobs = scoped_jobs(&state, &session).await?;
    let query = search.q.unwrap_or_default();
    let visible: Vec<Job> = apply_filters(&jobs, &query, &filters)
        .into_iter()
        .cloned()
        .collect();

    debug!(uid = %session.uid, total = jobs.len(), visible = visible.len(), "Listed jobs");
    Ok(Json(JobListResponse {
        total: visible.len(),
        jobs: visible,
    }))
}

/// Distinct values for the filter dropdowns
#[utoipa::path(
    get,
    path = "/api/v1/jobs/filter-options",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Filter options", body = FilterOptionsResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn filter_options(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<FilterOptionsResponse>, ApiError> {
    let jobs = scoped_jobs(&state, &session).await?;
    let options = extract_unique_values(&jobs)
        .into_iter()
        .map(|(field, values)| (field.to_string(), values))
        .collect();

    Ok(Json(FilterOptionsResponse { options }))
}

/// Tabular report of the filtered jobs over the selected columns
#[utoipa::path(
    get,
    path = "/api/v1/jobs/report",
    security(("bearer_auth" = [])),
    params(ReportParams, JobFilters),
    responses(
        (status = 200, description = "Report table", body = ReportTable),
        (status = 400, description = "Unknown column or invalid filter", body = ApiError),
        (status = 403, description = "Missing viewReports permission", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn job_report(
    State(state): State<AppState>,
    session: Session,
    params: Result<Query<ReportParams>, QueryRejection>,
    filters: Result<Query<JobFilters>, QueryRejection>,
) -> Result<Json<ReportTable>, ApiError> {
    session.require(Gate::Permission(capability::VIEW_REPORTS))?;
    let Query(params) = params?;
    let Query(filters) = filters?;

    let selection = ColumnSelection::parse(params.columns.as_deref().unwrap_or_default())
        .map_err(|err| {
            validation_error(
                "Unknown report column",
                serde_json::json!({ "columns": err.to_string() }),
            )
        })?;

    let jobs = scoped_jobs(&state, &session).await?;
    let query = params.q.unwrap_or_default();
    let matching = apply_filters(&jobs, &query, &filters);

    Ok(Json(build_report(matching, &selection, &state.formatter)))
}

/// Fetch one job
#[utoipa::path(
    get,
    path = "/api/v1/jobs/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job", body = Job),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn get_job(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    find_scoped(&state, &session, id).await.map(Json)
}

/// Create a job and assign its job number
#[utoipa::path(
    post,
    path = "/api/v1/jobs",
    security(("bearer_auth" = [])),
    request_body = JobDraft,
    responses(
        (status = 201, description = "Job created", body = Job),
        (status = 400, description = "Missing required field", body = ApiError),
        (status = 403, description = "Not an RM or superadmin", body = ApiError),
        (status = 409, description = "Job number collision", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn create_job(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<JobDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Job>), ApiError> {
    session.require(Gate::Role(Role::Rms))?;
    let Json(mut draft) = payload?;
    let required = draft.validate()?;

    if clean_text(draft.rm_name.as_deref()).is_none() {
        draft.rm_name = session.display_name();
    }

    let repository = JobRepository::new(&state.db);
    let prefix = state.job_numbers.prefix(required.shipment_type);
    // Other instances can still take a number between lookup and insert
    let issuing = state.job_numbers.begin_issue().await;
    let mut attempt = 1;
    let job = loop {
        let now = Utc::now();
        let existing = repository.job_numbers_with_prefix(prefix).await;
        let job_number = state.job_numbers.assign(required.shipment_type, existing, now);

        match repository
            .create(required.clone(), &draft, job_number.clone(), &session.uid, now)
            .await
        {
            Ok(job) => break job,
            Err(err) if err.is_unique_violation() && attempt < JOB_NUMBER_ATTEMPTS => {
                counter!("jobdesk_job_number_retries_total").increment(1);
                warn!(%job_number, attempt, "Job number already taken; retrying");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    };
    drop(issuing);

    counter!("jobdesk_jobs_created_total", "shipment_type" => job.shipment_type.as_str())
        .increment(1);
    info!(job_id = %job.id, job_number = %job.job_number, uid = %session.uid, "Job created");

    record_activity(&state, &session, "job.created", &job).await;
    republish(&state).await;

    Ok((StatusCode::CREATED, Json(job)))
}

/// Replace a job's editable fields
#[utoipa::path(
    put,
    path = "/api/v1/jobs/{id}",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = JobDraft,
    responses(
        (status = 200, description = "Job updated", body = Job),
        (status = 400, description = "Missing required field", body = ApiError),
        (status = 403, description = "Not an RM or superadmin", body = ApiError),
        (status = 404, description = "Job not found", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn update_job(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    payload: Result<Json<JobDraft>, JsonRejection>,
) -> Result<Json<Job>, ApiError> {
    session.require(Gate::Role(Role::Rms))?;
    let Json(draft) = payload?;
    let required = draft.validate()?;

    find_scoped(&state, &session, id).await?;
    let job = JobRepository::new(&state.db)
        .update(id, required, &draft, Utc::now())
        .await?;

    counter!("jobdesk_jobs_updated_total", "status" => job.status.as_str()).increment(1);
    info!(job_id = %job.id, job_number = %job.job_number, uid = %session.uid, "Job updated");

    record_activity(&state, &session, "job.updated", &job).await;
    republish(&state).await;

    Ok(Json(job))
}

/// Live job collection as server-sent events
#[utoipa::path(
    get,
    path = "/api/v1/jobs/stream",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "`jobs` events, each a full snapshot of the visible collection",
            content_type = "text/event-stream", body = Vec<Job>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "jobs"
)]
pub async fn stream_jobs(
    State(state): State<AppState>,
    session: Session,
    BearerToken(token): BearerToken,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    // Subscribe before loading so no write between the two is missed
    let subscription = state.feed.subscribe();
    let initial = Arc::new(JobRepository::new(&state.db).list_all().await?);
    debug!(uid = %session.uid, subscribers = state.feed.subscriber_count(), "Job stream opened");

    // Every snapshot re-resolves the token: logout, a replacing login or
    // expiry ends the stream, and permission changes apply to the next event.
    let sessions = state.sessions.clone();
    let events = stream::once(future::ready(initial))
        .chain(subscription.into_stream())
        .then(move |snapshot| {
            let sessions = sessions.clone();
            let token = token.clone();
            async move { sessions.resolve(&token).await.map(|session| (session, snapshot)) }
        })
        .take_while(move |resolved| {
            if resolved.is_none() {
                debug!(uid = %session.uid, "Job stream closed; session ended");
            }
            future::ready(resolved.is_some())
        })
        .filter_map(future::ready)
        .map(|(session, snapshot)| {
            let visible: Vec<&Job> = snapshot.iter().filter(|job| in_scope(&session, job)).collect();
            Event::default().event("jobs").json_data(&visible)
        });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ShipmentType, TransportMode};
    use crate::session::{LoginMethod, PermissionMap};

    fn session(uid: &str, role: Role, permissions: &[(&str, bool)]) -> Session {
        let now = Utc::now();
        Session {
            uid: uid.to_string(),
            email: None,
            first_name: None,
            last_name: None,
            role,
            permissions: permissions
                .iter()
                .map(|(name, granted)| (name.to_string(), *granted))
                .collect::<PermissionMap>(),
            login_method: LoginMethod::ShortCode,
            established_at: now,
            expires_at: now,
        }
    }

    fn job_by(uid: &str) -> Job {
        let mut job = Job::new("IMP-1/25-26", ShipmentType::Import, TransportMode::Sea, "S", "C");
        job.created_by = uid.to_string();
        job
    }

    #[test]
    fn rms_see_only_their_own_jobs() {
        let rm = session("rm-1", Role::Rms, &[]);
        assert!(in_scope(&rm, &job_by("rm-1")));
        assert!(!in_scope(&rm, &job_by("rm-2")));
    }

    #[test]
    fn view_all_permission_widens_scope() {
        let rm = session("rm-1", Role::Rms, &[(capability::VIEW_ALL_JOBS, true)]);
        assert!(in_scope(&rm, &job_by("rm-2")));

        let denied = session("rm-1", Role::Rms, &[(capability::VIEW_ALL_JOBS, false)]);
        assert!(!in_scope(&denied, &job_by("rm-2")));
    }

    #[test]
    fn superadmins_see_everything() {
        let admin = session("admin", Role::Superadmin, &[]);
        assert!(in_scope(&admin, &job_by("rm-2")));
    }
}
