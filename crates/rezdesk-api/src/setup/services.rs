//! Repository and service wiring.

use crate::state::{AppState, AuthState, DbState, ServiceState};
use anyhow::Result;
use rezdesk_core::Config;
use rezdesk_db::{
    InvitationRepository, PendingStaffRepository, PermissionMatrixRepository, ProviderRepository,
    StaffAssignmentRepository, TicketRepository, UserRepository,
};
use rezdesk_services::{
    AutomationClient, ClaimsService, CrmSync, FundingCheck, HttpIntrospector, InvitationService,
    JwksVerifier, OnboardingService, RbacService, TicketService, TokenVerifier,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Build every repository, service and verifier over the connected pool.
pub fn initialize_services(config: &Config, pool: PgPool) -> Result<Arc<AppState>> {
    let db = DbState {
        pool: pool.clone(),
        user_repository: UserRepository::new(pool.clone()),
        invitation_repository: InvitationRepository::new(pool.clone()),
        provider_repository: ProviderRepository::new(pool.clone()),
        pending_staff_repository: PendingStaffRepository::new(pool.clone()),
        permission_matrix_repository: PermissionMatrixRepository::new(pool.clone()),
        staff_assignment_repository: StaffAssignmentRepository::new(pool.clone()),
        ticket_repository: TicketRepository::new(pool),
    };

    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    // Automation platform is optional; without it tickets stay local and
    // funding verification is unavailable.
    let (crm, funding): (Option<Arc<dyn CrmSync>>, Option<Arc<dyn FundingCheck>>) = match (
        &config.automation_base_url,
        &config.automation_webhook_secret,
    ) {
        (Some(base_url), Some(secret)) => {
            let client = Arc::new(AutomationClient::new(
                http.clone(),
                base_url.clone(),
                secret.clone(),
            ));
            tracing::info!(base_url = %base_url, "automation platform configured");
            (Some(client.clone()), Some(client))
        }
        _ => {
            tracing::warn!("automation platform not configured; CRM sync and funding checks disabled");
            (None, None)
        }
    };

    let services = ServiceState {
        claims: ClaimsService::new(db.user_repository.clone()),
        invitations: InvitationService::new(
            db.invitation_repository.clone(),
            db.provider_repository.clone(),
            db.user_repository.clone(),
            config.invite_base_url.clone(),
        ),
        onboarding: OnboardingService::new(
            db.pending_staff_repository.clone(),
            db.user_repository.clone(),
            db.provider_repository.clone(),
        ),
        rbac: RbacService::new(
            db.permission_matrix_repository.clone(),
            db.staff_assignment_repository.clone(),
        ),
        tickets: TicketService::new(db.ticket_repository.clone(), crm),
        funding,
    };

    let jwks = Arc::new(JwksVerifier::new(
        config.jwks_url.clone(),
        Some(config.jwks_cache_ttl_seconds),
    ));
    let introspector = Arc::new(HttpIntrospector::new(
        http,
        config.introspection_url.clone(),
    ));
    let auth = AuthState {
        verifier: Arc::new(TokenVerifier::new(introspector, jwks.clone())),
        jwks,
    };

    Ok(Arc::new(AppState {
        db,
        services,
        auth,
        config: config.clone(),
        is_production: config.is_production(),
    }))
}
