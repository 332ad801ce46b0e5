//! OpenAPI documentation.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error;
use crate::handlers;
use rezdesk_core::models;

/// Returns the OpenAPI spec served at `/api/openapi.json`.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT or machine credential")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "RezDesk API",
        version = "0.1.0",
        description = "Student accommodation management backend (v0): role claims, staff invitations, onboarding queue, RBAC checks, support tickets and NSFAS funding verification. All endpoints are versioned under /api/v0/.",
    ),
    modifiers(&BearerAuth),
    paths(
        // Claims
        handlers::claims::set_claims,
        handlers::claims::trigger_claims_sync,
        // Invitations
        handlers::invitations::create_invitation,
        handlers::invitations::list_invitations,
        handlers::invitations::get_invitation,
        handlers::invitations::accept_invitation,
        handlers::invitations::revoke_invitation,
        // Onboarding
        handlers::onboarding::register_staff,
        handlers::onboarding::list_onboarding,
        // Permissions
        handlers::permissions::check_permissions,
        // Tickets
        handlers::tickets::create_ticket,
        handlers::tickets::list_tickets,
        // Funding
        handlers::funding::verify_funding,
    ),
    components(
        schemas(
            // Core models
            models::UserAccount,
            models::UserClaims,
            models::PendingStaff,
            models::OnboardingStatus,
            models::Ticket,
            models::TicketStatus,
            // Claims
            handlers::claims::SetClaimsRequest,
            handlers::claims::SetClaimsResponse,
            handlers::claims::TriggerClaimsSyncRequest,
            handlers::claims::TriggerClaimsSyncResponse,
            // Invitations
            handlers::invitations::CreateInvitationRequest,
            handlers::invitations::CreateInvitationResponse,
            handlers::invitations::ListInvitationsResponse,
            handlers::invitations::GetInvitationResponse,
            handlers::invitations::AcceptInvitationRequest,
            handlers::invitations::AcceptInvitationResponse,
            handlers::invitations::RevokeInvitationResponse,
            rezdesk_services::InvitationDetails,
            rezdesk_services::InvitationSummary,
            rezdesk_services::CreatedInvitation,
            // Onboarding
            handlers::onboarding::RegisterStaffRequest,
            handlers::onboarding::RegisterStaffResponse,
            handlers::onboarding::ListOnboardingResponse,
            // Permissions
            handlers::permissions::CheckPermissionsResponse,
            // Tickets
            handlers::tickets::CreateTicketRequest,
            handlers::tickets::CreateTicketResponse,
            handlers::tickets::ListTicketsResponse,
            // Funding
            handlers::funding::VerifyFundingRequest,
            handlers::funding::VerifyFundingResponse,
            // Error
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "claims", description = "Authorization claims writer (machine or admin credentials)"),
        (name = "invitations", description = "Staff invitation lifecycle: create, fetch, accept, revoke, list"),
        (name = "onboarding", description = "Staff registration queue awaiting external provisioning"),
        (name = "permissions", description = "Permission-key decisions for the calling user"),
        (name = "tickets", description = "Support tickets with best-effort CRM sync"),
        (name = "funding", description = "NSFAS funding verification")
    )
)]
pub struct ApiDoc;
