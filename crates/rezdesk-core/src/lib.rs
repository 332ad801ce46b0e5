//! Core domain types for the RezDesk platform.
//!
//! This crate holds the pieces shared by every other crate: the unified
//! `AppError` taxonomy, environment-driven configuration, the platform role
//! ladder, domain models, and input validation helpers. It deliberately has no
//! HTTP or database connectivity of its own (the `sqlx` feature only derives
//! row mappings on models).

pub mod config;
pub mod error;
pub mod models;
pub mod roles;
pub mod validation;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use roles::PlatformRole;
