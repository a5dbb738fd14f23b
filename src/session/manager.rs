//! Login flow: route the identifier, check credentials, resolve the profile,
//! establish the session.
//!
//! Identifiers containing the superadmin marker go to the identity provider.
//! Anything else is an RM short code looked up in the directory.

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use sea_orm::DatabaseConnection;

use super::provider::{ProviderError, verify_stored_secret};
use super::{IdentityProvider, LoginMethod, Principal, Session, SessionError, SessionStore};
use crate::repositories::{DirectoryRepository, ProfileRepository};

const ACTIVE_STATUS: &str = "active";

#[derive(Clone)]
pub struct SessionManager {
    db: DatabaseConnection,
    provider: Arc<dyn IdentityProvider>,
    store: Arc<SessionStore>,
    superadmin_marker: String,
}

impl SessionManager {
    pub fn new(
        db: DatabaseConnection,
        provider: Arc<dyn IdentityProvider>,
        store: Arc<SessionStore>,
        superadmin_marker: impl Into<String>,
    ) -> Self {
        Self {
            db,
            provider,
            store,
            superadmin_marker: superadmin_marker.into(),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Authenticate and establish a session, returning its bearer token.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<(String, Session), SessionError> {
        let result = self.try_login(identifier, password).await;
        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => err.outcome(),
        };
        counter!("jobdesk_logins_total", "outcome" => outcome).increment(1);
        result
    }

    async fn try_login(&self, identifier: &str, password: &str) -> Result<(String, Session), SessionError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(SessionError::InvalidIdentifier);
        }

        let (uid, method) = if identifier.contains(self.superadmin_marker.as_str()) {
            (self.provider_sign_in(identifier, password).await?, LoginMethod::Provider)
        } else {
            (self.short_code_sign_in(identifier, password).await?, LoginMethod::ShortCode)
        };

        let principal = self.resolve_profile(&uid, method).await?;
        let (token, session) = self.store.establish(principal, method).await;
        tracing::info!(uid = %session.uid, role = %session.role, ?method, "Session established");
        Ok((token, session))
    }

    async fn provider_sign_in(&self, email: &str, password: &str) -> Result<String, SessionError> {
        self.provider
            .sign_in(&email.to_lowercase(), password)
            .await
            .map_err(|err| match err {
                ProviderError::UnknownAccount => SessionError::InvalidIdentifier,
                ProviderError::WrongPassword => SessionError::IncorrectCredential,
                ProviderError::Disabled => SessionError::AccountInactive,
                ProviderError::Unavailable(details) => SessionError::Provider(details),
            })
    }

    async fn short_code_sign_in(&self, code: &str, password: &str) -> Result<String, SessionError> {
        let directory = DirectoryRepository::new(&self.db);
        let code = code.to_lowercase();

        let entry = directory
            .find_by_code(&code)
            .await?
            .ok_or(SessionError::InvalidIdentifier)?;

        if !verify_stored_secret(&entry.password, password) {
            return Err(SessionError::IncorrectCredential);
        }
        if !entry.status.trim().eq_ignore_ascii_case(ACTIVE_STATUS) {
            return Err(SessionError::AccountInactive);
        }

        if let Err(err) = directory.record_login(&code, Utc::now()).await {
            counter!("jobdesk_secondary_failures_total", "step" => "record_login").increment(1);
            tracing::warn!(code = %code, error = %err, "Failed to record last login");
        }

        Ok(entry.uid)
    }

    /// Load the profile for an authenticated uid. Any failure tears the
    /// identity back down before the error is returned.
    async fn resolve_profile(&self, uid: &str, method: LoginMethod) -> Result<Principal, SessionError> {
        let lookup = ProfileRepository::new(&self.db).find(uid).await;

        let error = match lookup {
            Ok(Some(model)) => match Principal::try_from(model) {
                Ok(principal) => return Ok(principal),
                Err(reason) => {
                    tracing::warn!(uid, %reason, "Profile is unusable");
                    SessionError::ProfileNotFound { uid: uid.to_string() }
                }
            },
            Ok(None) => SessionError::ProfileNotFound { uid: uid.to_string() },
            Err(err) => SessionError::Store(err),
        };

        self.tear_down_identity(uid, method).await;
        tracing::warn!(uid, error = %error, "Profile resolution failed; session cleared");
        Err(error)
    }

    async fn tear_down_identity(&self, uid: &str, method: LoginMethod) {
        self.store.teardown_uid(uid).await;
        if method == LoginMethod::Provider
            && let Err(err) = self.provider.sign_out(uid).await
        {
            tracing::warn!(uid, error = %err, "Provider sign-out failed");
        }
    }

    pub async fn resolve(&self, token: &str) -> Option<Session> {
        self.store.resolve(token).await
    }

    /// End the session behind `token`. Returns false if there was none.
    pub async fn logout(&self, token: &str) -> bool {
        let Some(session) = self.store.teardown(token).await else {
            return false;
        };

        if session.login_method == LoginMethod::Provider
            && let Err(err) = self.provider.sign_out(&session.uid).await
        {
            tracing::warn!(uid = %session.uid, error = %err, "Provider sign-out failed");
        }
        tracing::info!(uid = %session.uid, "Session ended");
        true
    }
}
