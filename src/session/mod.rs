//! # Sessions and Access Gates
//!
//! A [`Session`] is the resolved identity behind a bearer token: uid, role and
//! permission map. It is created by [`SessionManager::login`], kept in the
//! [`SessionStore`], and torn down on logout or expiry.
//!
//! Two gate kinds protect routes and they are deliberately separate:
//! a role gate admits the named role and always admits superadmins, while a
//! permission gate looks only at the permission map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::{ApiError, RepositoryError, forbidden};

pub mod manager;
pub mod provider;
pub mod store;

pub use manager::SessionManager;
pub use provider::{DbIdentityProvider, IdentityProvider, ProviderError};
pub use store::SessionStore;

/// Capability names checked by permission gates and job scoping. Creating
/// jobs and managing entities are role gates, not capabilities.
pub mod capability {
    pub const VIEW_ALL_JOBS: &str = "viewAllJobs";
    pub const VIEW_REPORTS: &str = "viewReports";

    pub const ALL: &[&str] = &[VIEW_ALL_JOBS, VIEW_REPORTS];
}

/// Capability name to granted flag.
pub type PermissionMap = BTreeMap<String, bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Superadmin,
    Rms,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Rms => "rms",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "superadmin" => Ok(Role::Superadmin),
            "rms" => Ok(Role::Rms),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum LoginMethod {
    /// Email and password checked by the identity provider
    Provider,
    /// RM short code checked against the directory
    ShortCode,
}

/// A profile as resolved after authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub uid: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub permissions: PermissionMap,
}

/// Read a stored permission document. Non-boolean entries are ignored.
pub fn permissions_from_json(value: &serde_json::Value) -> PermissionMap {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(name, granted)| granted.as_bool().map(|flag| (name.clone(), flag)))
                .collect()
        })
        .unwrap_or_default()
}

impl TryFrom<crate::models::user_profile::Model> for Principal {
    type Error = String;

    fn try_from(model: crate::models::user_profile::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            role: model.role.parse()?,
            permissions: permissions_from_json(&model.permissions),
            uid: model.uid,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
        })
    }
}

/// An authenticated session. Role and permissions are read-only for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub uid: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub permissions: PermissionMap,
    pub login_method: LoginMethod,
    pub established_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A route or action guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Admits the role, and superadmins regardless of their permission map
    Role(Role),
    /// Admits only sessions whose permission map grants the capability
    Permission(&'static str),
}

impl Session {
    pub fn is_superadmin(&self) -> bool {
        self.role == Role::Superadmin
    }

    pub fn has_permission(&self, capability: &str) -> bool {
        self.permissions.get(capability).copied().unwrap_or(false)
    }

    pub fn permits(&self, gate: Gate) -> bool {
        match gate {
            Gate::Role(role) => self.is_superadmin() || self.role == role,
            Gate::Permission(capability) => self.has_permission(capability),
        }
    }

    pub fn require(&self, gate: Gate) -> Result<(), ApiError> {
        if self.permits(gate) {
            return Ok(());
        }

        tracing::info!(uid = %self.uid, role = %self.role, ?gate, "Access denied");
        let message = match gate {
            Gate::Role(Role::Superadmin) => "Superadmin access required".to_string(),
            Gate::Role(role) => format!("Requires the '{role}' role"),
            Gate::Permission(capability) => format!("Missing permission '{capability}'"),
        };
        Err(forbidden(Some(&message)))
    }

    /// Display name assembled from the profile, falling back to the email.
    pub fn display_name(&self) -> Option<String> {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if full.is_empty() {
            self.email.clone()
        } else {
            Some(full)
        }
    }
}

/// Why a login attempt failed.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no account matches this identifier")]
    InvalidIdentifier,
    #[error("incorrect password")]
    IncorrectCredential,
    #[error("account is inactive")]
    AccountInactive,
    #[error("no profile found for uid {uid}")]
    ProfileNotFound { uid: String },
    #[error("identity provider failure: {0}")]
    Provider(String),
    #[error("session store failure: {0}")]
    Store(#[from] RepositoryError),
}

impl SessionError {
    /// Short outcome label for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            SessionError::InvalidIdentifier => "invalid_identifier",
            SessionError::IncorrectCredential => "incorrect_credential",
            SessionError::AccountInactive => "account_inactive",
            SessionError::ProfileNotFound { .. } => "profile_not_found",
            SessionError::Provider(_) => "provider_error",
            SessionError::Store(_) => "store_error",
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::InvalidIdentifier => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "INVALID_IDENTIFIER",
                "No account found for this login ID",
            ),
            SessionError::IncorrectCredential => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "INCORRECT_CREDENTIAL",
                "Incorrect password",
            ),
            SessionError::AccountInactive => ApiError::new(
                StatusCode::FORBIDDEN,
                "ACCOUNT_INACTIVE",
                "This account is inactive. Contact an administrator.",
            ),
            SessionError::ProfileNotFound { .. } => ApiError::new(
                StatusCode::FORBIDDEN,
                "PROFILE_NOT_FOUND",
                "No user profile exists for this account",
            ),
            SessionError::Provider(details) => {
                tracing::error!(%details, "Identity provider failure during login");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Sign-in is temporarily unavailable",
                )
            }
            SessionError::Store(err) => err.into(),
        }
    }
}
