//! # Job Desk Library
//!
//! Core of the shipment job desk: the job filter engine, field formatter,
//! column projection and session gate, plus the HTTP service built on them.

pub mod auth;
pub mod blob;
pub mod columns;
pub mod config;
pub mod date_value;
pub mod db;
pub mod domain;
pub mod error;
pub mod feed;
pub mod fields;
pub mod filter;
pub mod format;
pub mod handlers;
pub mod job_number;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod session;
pub mod telemetry;
pub use migration;
