//! Database migrations for the job desk service.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_05_000001_create_user_profiles;
mod m2026_01_05_000002_create_provider_accounts;
mod m2026_01_05_000003_create_rm_directory;
mod m2026_01_05_000004_create_jobs;
mod m2026_01_05_000005_create_counterparties;
mod m2026_01_05_000006_create_activity_log;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_05_000001_create_user_profiles::Migration),
            Box::new(m2026_01_05_000002_create_provider_accounts::Migration),
            Box::new(m2026_01_05_000003_create_rm_directory::Migration),
            Box::new(m2026_01_05_000004_create_jobs::Migration),
            Box::new(m2026_01_05_000005_create_counterparties::Migration),
            Box::new(m2026_01_05_000006_create_activity_log::Migration),
        ]
    }
}
