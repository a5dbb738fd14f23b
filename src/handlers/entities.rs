//! # Entity Handlers
//!
//! Shippers, consignees and overseas agents. Any session may read the lists;
//! only superadmins change them.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use metrics::counter;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Counterparty, CounterpartyDraft, EntityKind};
use crate::error::ApiError;
use crate::repositories::CounterpartyRepository;
use crate::server::AppState;
use crate::session::{Gate, Role, Session};

const ADMIN_ONLY: Gate = Gate::Role(Role::Superadmin);

/// Remove a document that is no longer referenced. Failures are logged and
/// never undo the write that orphaned it.
async fn delete_document(state: &AppState, kind: EntityKind, document_url: &str) {
    if let Err(err) = state.blob_store.delete(document_url).await {
        counter!("jobdesk_secondary_failures_total", "step" => "blob_delete").increment(1);
        warn!(%kind, document_url, error = %err, "Failed to delete orphaned document");
    }
}

/// List entities of a kind, sorted by name
#[utoipa::path(
    get,
    path = "/api/v1/entities/{kind}",
    security(("bearer_auth" = [])),
    params(("kind" = EntityKind, Path, description = "shipper, consignee or overseas-agent")),
    responses(
        (status = 200, description = "Entities", body = Vec<Counterparty>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "entities"
)]
pub async fn list_entities(
    State(state): State<AppState>,
    _session: Session,
    Path(kind): Path<EntityKind>,
) -> Result<Json<Vec<Counterparty>>, ApiError> {
    let entities = CounterpartyRepository::new(&state.db).list(kind).await?;
    Ok(Json(entities))
}

/// Create an entity
#[utoipa::path(
    post,
    path = "/api/v1/entities/{kind}",
    security(("bearer_auth" = [])),
    params(("kind" = EntityKind, Path, description = "shipper, consignee or overseas-agent")),
    request_body = CounterpartyDraft,
    responses(
        (status = 201, description = "Entity created", body = Counterparty),
        (status = 400, description = "Invalid field", body = ApiError),
        (status = 403, description = "Superadmin access required", body = ApiError),
        (status = 409, description = "Name already used for this kind", body = ApiError)
    ),
    tag = "entities"
)]
pub async fn create_entity(
    State(state): State<AppState>,
    session: Session,
    Path(kind): Path<EntityKind>,
    payload: Result<Json<CounterpartyDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Counterparty>), ApiError> {
    session.require(ADMIN_ONLY)?;
    let Json(draft) = payload?;

    let entity = CounterpartyRepository::new(&state.db)
        .create(kind, &draft)
        .await?;

    counter!("jobdesk_entity_mutations_total", "kind" => kind.as_str(), "action" => "create")
        .increment(1);
    info!(%kind, id = %entity.id, name = %entity.name, "Entity created");
    Ok((StatusCode::CREATED, Json(entity)))
}

/// Update an entity
#[utoipa::path(
    put,
    path = "/api/v1/entities/{kind}/{id}",
    security(("bearer_auth" = [])),
    params(
        ("kind" = EntityKind, Path, description = "shipper, consignee or overseas-agent"),
        ("id" = Uuid, Path, description = "Entity ID")
    ),
    request_body = CounterpartyDraft,
    responses(
        (status = 200, description = "Entity updated", body = Counterparty),
        (status = 400, description = "Invalid field", body = ApiError),
        (status = 403, description = "Superadmin access required", body = ApiError),
        (status = 404, description = "Entity not found", body = ApiError),
        (status = 409, description = "Name already used for this kind", body = ApiError)
    ),
    tag = "entities"
)]
pub async fn update_entity(
    State(state): State<AppState>,
    session: Session,
    Path((kind, id)): Path<(EntityKind, Uuid)>,
    payload: Result<Json<CounterpartyDraft>, JsonRejection>,
) -> Result<Json<Counterparty>, ApiError> {
    session.require(ADMIN_ONLY)?;
    let Json(draft) = payload?;

    let updated = CounterpartyRepository::new(&state.db)
        .update(kind, id, &draft)
        .await?;

    counter!("jobdesk_entity_mutations_total", "kind" => kind.as_str(), "action" => "update")
        .increment(1);
    info!(%kind, %id, "Entity updated");

    if let Some(document_url) = &updated.replaced_document_url {
        delete_document(&state, kind, document_url).await;
    }
    Ok(Json(updated.counterparty))
}

/// Delete an entity and its document
#[utoipa::path(
    delete,
    path = "/api/v1/entities/{kind}/{id}",
    security(("bearer_auth" = [])),
    params(
        ("kind" = EntityKind, Path, description = "shipper, consignee or overseas-agent"),
        ("id" = Uuid, Path, description = "Entity ID")
    ),
    responses(
        (status = 204, description = "Entity deleted"),
        (status = 403, description = "Superadmin access required", body = ApiError),
        (status = 404, description = "Entity not found", body = ApiError)
    ),
    tag = "entities"
)]
pub async fn delete_entity(
    State(state): State<AppState>,
    session: Session,
    Path((kind, id)): Path<(EntityKind, Uuid)>,
) -> Result<StatusCode, ApiError> {
    session.require(ADMIN_ONLY)?;

    let deleted = CounterpartyRepository::new(&state.db).delete(kind, id).await?;

    counter!("jobdesk_entity_mutations_total", "kind" => kind.as_str(), "action" => "delete")
        .increment(1);
    info!(%kind, %id, name = %deleted.name, "Entity deleted");

    if let Some(document_url) = &deleted.document_url {
        delete_document(&state, kind, document_url).await;
    }
    Ok(StatusCode::NO_CONTENT)
}
