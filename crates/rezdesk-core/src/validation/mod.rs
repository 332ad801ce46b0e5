//! Validation modules

pub mod identity;

pub use identity::{validate_email, validate_sa_id_number, IdNumberError};
