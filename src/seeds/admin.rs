//! Bootstrap superadmin seeding
//!
//! When bootstrap credentials are configured, make sure a provider account and
//! a `superadmin` profile exist for them. Running it again changes nothing.

use anyhow::{Context, Result};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::repositories::ProfileRepository;
use crate::repositories::profile::NewProfile;
use crate::session::{DbIdentityProvider, Role, capability};

/// Seeds the bootstrap superadmin, if configured.
///
/// Returns the admin uid, or `None` when no bootstrap credentials are set.
pub async fn seed_bootstrap_admin(
    db: &DatabaseConnection,
    config: &AppConfig,
) -> Result<Option<String>> {
    let (Some(email), Some(password)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) else {
        log::debug!("No bootstrap admin configured, skipping");
        return Ok(None);
    };

    let uid = DbIdentityProvider::new(db.clone())
        .ensure_account(email, password)
        .await
        .context("Failed to ensure bootstrap admin account")?;

    let profiles = ProfileRepository::new(db);
    if let Some(existing) = profiles.find(&uid).await? {
        if existing.role.parse::<Role>().ok() == Some(Role::Superadmin) {
            log::info!("Bootstrap admin '{}' already exists, skipping", email);
            return Ok(Some(uid));
        }
        log::warn!(
            "Profile for bootstrap admin '{}' has role '{}', promoting to superadmin",
            email,
            existing.role
        );
    }

    let permissions: serde_json::Map<String, serde_json::Value> = capability::ALL
        .iter()
        .map(|name| (name.to_string(), serde_json::Value::Bool(true)))
        .collect();

    profiles
        .upsert(NewProfile {
            uid: uid.clone(),
            email: Some(email.trim().to_lowercase()),
            first_name: Some("Admin".to_string()),
            last_name: None,
            role: Role::Superadmin.as_str().to_string(),
            permissions: serde_json::Value::Object(permissions),
        })
        .await
        .context("Failed to write bootstrap admin profile")?;

    log::info!("Bootstrap admin '{}' seeded", email);
    Ok(Some(uid))
}
