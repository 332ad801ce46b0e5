//! Invitation lifecycle handlers.
//!
//! Create, list and revoke require an authenticated platform user; fetch and
//! accept are reached by the invitee before they hold any claims, so those two
//! routes are public and throttled by the sensitive rate tier.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::scoped_provider_id;
use crate::state::ServiceState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rezdesk_core::models::{UserAccount, UserClaims};
use rezdesk_core::{AppError, PlatformRole};
use rezdesk_services::{
    AcceptInvitation, CreateInvitation, InvitationDetails, InvitationSummary,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInvitationRequest {
    pub email: String,
    /// Role name to grant, e.g. `provider_staff` or `provider_owner`.
    #[serde(rename = "assignedRole")]
    pub assigned_role: String,
    #[serde(rename = "providerId")]
    pub provider_id: Option<Uuid>,
    #[serde(rename = "invitedByName")]
    pub invited_by_name: Option<String>,
    #[serde(rename = "invitedByEmail")]
    pub invited_by_email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateInvitationResponse {
    pub success: bool,
    #[serde(rename = "invitationId")]
    pub invitation_id: Uuid,
    #[serde(rename = "inviteUrl")]
    pub invite_url: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

/// Issue an invitation for one email within one provider.
#[utoipa::path(
    post,
    path = "/api/v0/invitations",
    tag = "invitations",
    request_body = CreateInvitationRequest,
    responses(
        (status = 200, description = "Invitation created", body = CreateInvitationResponse),
        (status = 400, description = "Invalid email or role", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not grant this role", body = ErrorResponse),
        (status = 404, description = "Provider not found", body = ErrorResponse),
        (status = 409, description = "A pending invitation already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, ctx, request))]
pub async fn create_invitation(
    State(services): State<ServiceState>,
    ctx: UserContext,
    ValidatedJson(request): ValidatedJson<CreateInvitationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let invited_by = ctx.require_user_id()?;
    let provider_id = scoped_provider_id(&ctx, request.provider_id)?;

    // Inviter identity and role come from the verified token, never from the
    // request body.
    let created = services
        .invitations
        .create(CreateInvitation {
            email: request.email,
            assigned_role: request.assigned_role,
            provider_id,
            invited_by,
            invited_by_name: request.invited_by_name,
            invited_by_email: request.invited_by_email.or_else(|| ctx.email.clone()),
            inviter_role_code: ctx.role_code,
        })
        .await?;

    Ok(Json(CreateInvitationResponse {
        success: true,
        invitation_id: created.invitation_id,
        invite_url: created.invite_url,
        expires_at: created.expires_at,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListInvitationsQuery {
    #[serde(rename = "providerId")]
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListInvitationsResponse {
    pub success: bool,
    pub invitations: Vec<InvitationSummary>,
}

/// List a provider's invitations with read-time effective status.
#[utoipa::path(
    get,
    path = "/api/v0/invitations",
    tag = "invitations",
    params(
        ("providerId" = Option<Uuid>, Query, description = "Provider to list; defaults to the caller's provider")
    ),
    responses(
        (status = 200, description = "Invitations for the provider", body = ListInvitationsResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view this provider", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, ctx))]
pub async fn list_invitations(
    State(services): State<ServiceState>,
    ctx: UserContext,
    Query(query): Query<ListInvitationsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let provider_id = scoped_provider_id(&ctx, query.provider_id)?;
    let invitations = services.invitations.list(provider_id).await?;

    Ok(Json(ListInvitationsResponse {
        success: true,
        invitations,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GetInvitationResponse {
    pub success: bool,
    pub invitation: InvitationDetails,
}

/// Resolve an invitation token for the accept page. Public; the token itself
/// is the credential.
#[utoipa::path(
    get,
    path = "/api/v0/invitations/{token}",
    tag = "invitations",
    params(
        ("token" = String, Path, description = "Invitation token")
    ),
    responses(
        (status = 200, description = "Pending invitation details", body = GetInvitationResponse),
        (status = 404, description = "Invitation not found", body = ErrorResponse),
        (status = 410, description = "Invitation accepted, revoked or expired", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(services, token))]
pub async fn get_invitation(
    State(services): State<ServiceState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let invitation = services.invitations.fetch(&token).await?;

    Ok(Json(GetInvitationResponse {
        success: true,
        invitation,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AcceptInvitationRequest {
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub email: String,
    #[serde(rename = "firstNames")]
    pub first_names: String,
    pub surname: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(rename = "idNumber")]
    pub id_number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AcceptInvitationResponse {
    pub success: bool,
    pub user: UserAccount,
    /// Claims to apply through the claims writer; the account stays marked
    /// sync-pending until that second phase lands.
    #[serde(rename = "claimsData")]
    pub claims_data: UserClaims,
}

/// Accept an invitation: first writer wins, ties and repeats get 410.
#[utoipa::path(
    post,
    path = "/api/v0/invitations/accept",
    tag = "invitations",
    request_body = AcceptInvitationRequest,
    responses(
        (status = 200, description = "Invitation accepted", body = AcceptInvitationResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 403, description = "Email does not match the invitation", body = ErrorResponse),
        (status = 404, description = "Invitation not found", body = ErrorResponse),
        (status = 410, description = "Invitation no longer pending", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(services, request))]
pub async fn accept_invitation(
    State(services): State<ServiceState>,
    ValidatedJson(request): ValidatedJson<AcceptInvitationRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let accepted = services
        .invitations
        .accept(AcceptInvitation {
            token: request.token,
            user_id: request.user_id,
            email: request.email,
            first_names: request.first_names,
            surname: request.surname,
            phone_number: request.phone_number,
            id_number: request.id_number,
        })
        .await?;

    Ok(Json(AcceptInvitationResponse {
        success: true,
        user: accepted.user,
        claims_data: accepted.claims_data,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RevokeInvitationResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "invitationId")]
    pub invitation_id: Uuid,
}

/// Revoke a pending invitation.
#[utoipa::path(
    post,
    path = "/api/v0/invitations/{token}/revoke",
    tag = "invitations",
    params(
        ("token" = String, Path, description = "Invitation token")
    ),
    responses(
        (status = 200, description = "Invitation revoked", body = RevokeInvitationResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not revoke invitations", body = ErrorResponse),
        (status = 404, description = "Invitation not found", body = ErrorResponse),
        (status = 410, description = "Invitation no longer pending", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, ctx, token))]
pub async fn revoke_invitation(
    State(services): State<ServiceState>,
    ctx: UserContext,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    if ctx.role_code < PlatformRole::ProviderOwner.code() {
        return Err(HttpAppError(AppError::Forbidden(
            "Only owners and administrators may revoke invitations".to_string(),
        )));
    }

    // Owners may only revoke within their own provider; resolve the target
    // before touching it.
    let target = services.invitations.fetch(&token).await?;
    if ctx.role_code < PlatformRole::Admin.code() && ctx.provider_id != Some(target.provider_id) {
        return Err(HttpAppError(AppError::Forbidden(
            "Cannot revoke another provider's invitation".to_string(),
        )));
    }

    let revoked = services.invitations.revoke(&token).await?;

    Ok(Json(RevokeInvitationResponse {
        success: true,
        message: "Invitation revoked".to_string(),
        invitation_id: revoked.id,
    }))
}
