//! # Authentication
//!
//! Bearer-token middleware for protected API endpoints. The token is resolved
//! against the session store and the resulting [`Session`] is attached to the
//! request for handlers to extract.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::error::{ApiError, unauthorized};
use crate::server::AppState;
use crate::session::Session;

/// The raw bearer token of an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(pub String);

/// Authentication middleware that resolves bearer tokens to sessions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?.to_string();

    let session = state
        .sessions
        .resolve(&token)
        .await
        .ok_or_else(|| unauthorized(Some("Session is invalid or has expired")))?;

    tracing::debug!(uid = %session.uid, role = %session.role, "Authenticated request");

    request.extensions_mut().insert(session);
    request.extensions_mut().insert(BearerToken(token));

    Ok(next.run(request).await)
}

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))?
        .trim();

    if token.is_empty() {
        return Err(unauthorized(Some("Bearer token is empty")));
    }
    Ok(token)
}

impl<S> FromRequestParts<S> for Session
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Authentication required")))
    }
}

impl<S> FromRequestParts<S> for BearerToken
where
    S: Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<BearerToken>()
            .cloned()
            .ok_or_else(|| unauthorized(Some("Authentication required")))
    }
}
