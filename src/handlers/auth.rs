//! # Auth Handlers
//!
//! Login, logout and session introspection.

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::BearerToken;
use crate::error::ApiError;
use crate::server::AppState;
use crate::session::Session;

/// Login credentials. The identifier is either an RM short code or, for
/// superadmins, an email address.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "rm042")]
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    pub session: Session,
}

/// Authenticate and open a session
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session established", body = LoginResponse),
        (status = 401, description = "Unknown identifier or wrong password", body = ApiError),
        (status = 403, description = "Account inactive or profile missing", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;
    let (token, session) = state
        .sessions
        .login(&request.identifier, &request.password)
        .await?;

    Ok(Json(LoginResponse { token, session }))
}

/// End the current session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn logout(State(state): State<AppState>, BearerToken(token): BearerToken) -> StatusCode {
    state.sessions.logout(&token).await;
    StatusCode::NO_CONTENT
}

/// The session behind the bearer token
#[utoipa::path(
    get,
    path = "/api/v1/auth/session",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current session", body = Session),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn current_session(session: Session) -> Json<Session> {
    Json(session)
}
