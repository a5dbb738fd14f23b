//! # Repository Layer
//!
//! Repositories wrap SeaORM queries for each table and convert storage rows
//! into domain records.

pub mod activity;
pub mod counterparty;
pub mod directory;
pub mod job;
pub mod profile;

pub use activity::ActivityRepository;
pub use counterparty::CounterpartyRepository;
pub use directory::DirectoryRepository;
pub use job::JobRepository;
pub use profile::ProfileRepository;
