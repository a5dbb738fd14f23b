//! Database seeding functionality
//!
//! Startup seeding that makes a fresh installation usable: the bootstrap
//! superadmin account and profile.

pub mod admin;

pub use admin::seed_bootstrap_admin;
