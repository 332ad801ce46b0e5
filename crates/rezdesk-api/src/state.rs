//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what
//! they need via Axum's `FromRef`, and to avoid a single god object with
//! duplicate repositories.

use rezdesk_core::Config;
use rezdesk_db::{
    InvitationRepository, PendingStaffRepository, PermissionMatrixRepository, ProviderRepository,
    StaffAssignmentRepository, TicketRepository, UserRepository,
};
use rezdesk_services::{
    ClaimsService, FundingCheck, InvitationService, JwksVerifier, OnboardingService, RbacService,
    TicketService, TokenVerifier,
};
use sqlx::PgPool;
use std::sync::Arc;

// ----- Sub-state types -----

/// Database pool and repositories.
#[derive(Clone)]
pub struct DbState {
    pub pool: PgPool,
    pub user_repository: UserRepository,
    pub invitation_repository: InvitationRepository,
    pub provider_repository: ProviderRepository,
    pub pending_staff_repository: PendingStaffRepository,
    pub permission_matrix_repository: PermissionMatrixRepository,
    pub staff_assignment_repository: StaffAssignmentRepository,
    pub ticket_repository: TicketRepository,
}

/// Domain services built over the repositories.
#[derive(Clone)]
pub struct ServiceState {
    pub claims: ClaimsService,
    pub invitations: InvitationService,
    pub onboarding: OnboardingService,
    pub rbac: RbacService,
    pub tickets: TicketService,
    /// Present only when the automation platform is configured.
    pub funding: Option<Arc<dyn FundingCheck>>,
}

/// Credential verification for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<TokenVerifier>,
    pub jwks: Arc<JwksVerifier>,
}

// ----- AppState -----

/// Main application state: aggregates sub-states for dependency injection.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub services: ServiceState,
    pub auth: AuthState,
    pub config: Config,
    pub is_production: bool,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for ServiceState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.services.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for AuthState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.auth.clone()
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
