pub mod invitation;
pub mod onboarding;
pub mod provider;
pub mod rbac;
pub mod ticket;
pub mod user;

pub use invitation::{effective_status, EffectiveStatus, Invitation, InvitationStatus};
pub use onboarding::{OnboardingStatus, PendingStaff};
pub use provider::{Provider, ProviderStatus};
pub use rbac::{PermissionMatrix, ProviderRolePermissions, StaffAssignment};
pub use ticket::{Ticket, TicketStatus};
pub use user::{UserAccount, UserClaims};
