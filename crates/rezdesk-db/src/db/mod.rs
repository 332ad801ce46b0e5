//! Database repositories for data access layer
//!
//! Each repository is responsible for a specific domain entity and provides
//! CRUD operations and specialized queries. Uniqueness rules that matter for
//! correctness (one live pending invitation per email+provider, one pending
//! onboarding draft per email) are enforced with partial unique indexes and
//! conditional inserts, not read-then-write checks.

pub mod invitation;
pub mod onboarding;
pub mod provider;
pub mod rbac;
pub mod ticket;
pub mod user;

pub use invitation::InvitationRepository;
pub use onboarding::PendingStaffRepository;
pub use provider::ProviderRepository;
pub use rbac::{PermissionMatrixRepository, StaffAssignmentRepository};
pub use ticket::TicketRepository;
pub use user::UserRepository;
