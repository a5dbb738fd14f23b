//! Identity provider seam and the database-backed implementation.
//!
//! Stored secrets use the form `hmac-sha256$<salt hex>$<digest hex>`, where the
//! digest is HMAC-SHA256 keyed by the salt over the password. Comparisons are
//! constant-time.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use uuid::Uuid;

use crate::models::provider_account::{self, Entity as ProviderAccount};

type HmacSha256 = Hmac<Sha256>;

const HASH_SCHEME: &str = "hmac-sha256";
const SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown account")]
    UnknownAccount,
    #[error("wrong password")]
    WrongPassword,
    #[error("account disabled")]
    Disabled,
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Provider-native email/password authentication.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials and return the account uid.
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, ProviderError>;

    /// End any provider-side state for `uid`.
    async fn sign_out(&self, uid: &str) -> Result<(), ProviderError>;
}

fn digest(salt: &[u8], password: &str) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(salt).ok()?;
    mac.update(password.as_bytes());
    Some(mac.finalize().into_bytes().to_vec())
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    // HMAC accepts keys of any length, so the digest is always present
    let digest = digest(&salt, password).unwrap_or_default();
    format!("{HASH_SCHEME}${}${}", hex::encode(salt), hex::encode(digest))
}

/// Check `candidate` against a hashed secret. Anything not in the hashed
/// format fails.
pub fn verify_hashed(stored: &str, candidate: &str) -> bool {
    let mut parts = stored.splitn(3, '$');
    let (Some(HASH_SCHEME), Some(salt), Some(expected)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };

    digest(&salt, candidate).is_some_and(|actual| bool::from(actual.ct_eq(&expected)))
}

/// Check `candidate` against a secret that may be hashed or plaintext.
pub fn verify_stored_secret(stored: &str, candidate: &str) -> bool {
    if stored.starts_with(HASH_SCHEME) && stored.contains('$') {
        return verify_hashed(stored, candidate);
    }
    bool::from(stored.as_bytes().ct_eq(candidate.as_bytes()))
}

/// Identity provider backed by the `provider_accounts` table.
#[derive(Debug, Clone)]
pub struct DbIdentityProvider {
    db: DatabaseConnection,
}

impl DbIdentityProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register an account, or return the existing uid if the email is taken.
    pub async fn ensure_account(&self, email: &str, password: &str) -> Result<String, ProviderError> {
        let email = email.trim().to_lowercase();
        if let Some(existing) = self.find_by_email(&email).await? {
            return Ok(existing.uid);
        }

        let uid = Uuid::new_v4().to_string();
        provider_account::ActiveModel {
            uid: Set(uid.clone()),
            email: Set(email),
            password_hash: Set(hash_password(password)),
            disabled: Set(false),
            created_at: Set(chrono::Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await
        .map_err(|err| ProviderError::Unavailable(err.to_string()))?;

        Ok(uid)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<provider_account::Model>, ProviderError> {
        ProviderAccount::find()
            .filter(provider_account::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|err| ProviderError::Unavailable(err.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for DbIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<String, ProviderError> {
        let email = email.trim().to_lowercase();
        let account = self
            .find_by_email(&email)
            .await?
            .ok_or(ProviderError::UnknownAccount)?;

        if !verify_hashed(&account.password_hash, password) {
            return Err(ProviderError::WrongPassword);
        }
        if account.disabled {
            return Err(ProviderError::Disabled);
        }

        Ok(account.uid)
    }

    async fn sign_out(&self, uid: &str) -> Result<(), ProviderError> {
        // Tokens are issued by the session store; there is no provider-side state.
        tracing::debug!(uid, "Provider sign-out");
        Ok(())
    }
}
