//! # Data Models
//!
//! SeaORM entities for every table the job desk owns, plus small response
//! types shared by the service surfaces.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod activity_log;
pub mod counterparty;
pub mod job;
pub mod provider_account;
pub mod rm_directory;
pub mod user_profile;

pub use activity_log::Entity as ActivityLog;
pub use counterparty::Entity as Counterparty;
pub use job::Entity as Job;
pub use provider_account::Entity as ProviderAccount;
pub use rm_directory::Entity as RmDirectory;
pub use user_profile::Entity as UserProfile;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "jobdesk".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
