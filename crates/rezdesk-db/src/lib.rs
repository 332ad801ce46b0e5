//! Data access layer for RezDesk.
//!
//! All durable state lives in Postgres and is reached through the
//! repositories in [`db`]; each repository owns one aggregate and is a cheap
//! `Clone` over a shared [`sqlx::PgPool`]. Queries are built with dynamic
//! `sqlx::query`/`query_as` so builds do not require a live database.

pub mod db;

pub use db::{
    InvitationRepository, PendingStaffRepository, PermissionMatrixRepository, ProviderRepository,
    StaffAssignmentRepository, TicketRepository, UserRepository,
};
