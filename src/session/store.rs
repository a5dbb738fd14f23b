//! In-memory session store keyed by opaque bearer tokens.
//!
//! A uid has at most one live session: establishing a new one tears the old
//! one down.

use std::collections::HashMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tokio::sync::RwLock;

use super::{LoginMethod, Principal, Session};

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Default)]
struct Sessions {
    by_token: HashMap<String, Session>,
    token_by_uid: HashMap<String, String>,
}

impl Sessions {
    fn remove_token(&mut self, token: &str) -> Option<Session> {
        let session = self.by_token.remove(token)?;
        if self.token_by_uid.get(&session.uid).map(String::as_str) == Some(token) {
            self.token_by_uid.remove(&session.uid);
        }
        Some(session)
    }
}

#[derive(Debug)]
pub struct SessionStore {
    ttl: Duration,
    sessions: RwLock<Sessions>,
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(Sessions::default()),
        }
    }

    pub fn from_minutes(minutes: u64) -> Self {
        let ttl = i64::try_from(minutes)
            .ok()
            .and_then(Duration::try_minutes)
            .unwrap_or(Duration::MAX);
        Self::new(ttl)
    }

    /// Issue a token for `principal`, replacing any session the uid already has.
    pub async fn establish(&self, principal: Principal, login_method: LoginMethod) -> (String, Session) {
        let now = Utc::now();
        let session = Session {
            uid: principal.uid,
            email: principal.email,
            first_name: principal.first_name,
            last_name: principal.last_name,
            role: principal.role,
            permissions: principal.permissions,
            login_method,
            established_at: now,
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        let token = new_token();

        let mut sessions = self.sessions.write().await;
        if let Some(previous) = sessions.token_by_uid.insert(session.uid.clone(), token.clone()) {
            sessions.by_token.remove(&previous);
            tracing::info!(uid = %session.uid, "Replaced existing session");
        }
        sessions.by_token.insert(token.clone(), session.clone());

        (token, session)
    }

    /// The live session for `token`. Expired sessions are dropped on sight.
    pub async fn resolve(&self, token: &str) -> Option<Session> {
        {
            let sessions = self.sessions.read().await;
            let session = sessions.by_token.get(token)?;
            if session.expires_at > Utc::now() {
                return Some(session.clone());
            }
        }

        let mut sessions = self.sessions.write().await;
        if let Some(expired) = sessions.remove_token(token) {
            tracing::debug!(uid = %expired.uid, "Session expired");
        }
        None
    }

    pub async fn teardown(&self, token: &str) -> Option<Session> {
        self.sessions.write().await.remove_token(token)
    }

    /// Tear down whatever session `uid` holds.
    pub async fn teardown_uid(&self, uid: &str) -> Option<Session> {
        let mut sessions = self.sessions.write().await;
        let token = sessions.token_by_uid.get(uid).cloned()?;
        sessions.remove_token(&token)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.by_token.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
