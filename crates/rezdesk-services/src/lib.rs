//! RezDesk service layer.
//!
//! This crate is the **business service layer**: stateless domain services
//! orchestrating repositories and external collaborators. Keep coordination
//! and decision logic here; keep thin HTTP handling in rezdesk-api.
//!
//! External collaborators (token introspection, identity-provider JWKS, the
//! automation platform) sit behind traits so every decision path is
//! unit-testable without the network.

pub mod automation;
pub mod claims;
pub mod invitations;
pub mod jwks;
pub mod onboarding;
pub mod rbac;
pub mod tickets;
pub mod verify;

pub use automation::{AutomationClient, CrmSync, FundingCheck, FundingVerification};
pub use claims::{ClaimsService, ClaimsUpdate};
pub use invitations::{
    AcceptInvitation, AcceptedInvitation, CreateInvitation, CreatedInvitation, InvitationDetails,
    InvitationService, InvitationSummary,
};
pub use jwks::{IdentityClaims, JwksVerifier};
pub use onboarding::{OnboardingService, StaffRegistration};
pub use rbac::RbacService;
pub use tickets::TicketService;
pub use verify::{
    AdminActor, AuthMethod, HttpIntrospector, Introspection, MachineIntrospector, TokenVerifier,
    UserTokenVerifier,
};
