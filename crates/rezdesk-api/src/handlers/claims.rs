//! Claims writer handlers.
//!
//! These endpoints sit behind the dual-credential admin gate: a machine
//! credential from the automation platform, or an admin-tier user token. The
//! verified actor arrives as [`AdminContext`].

use crate::auth::models::AdminContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::ServiceState;
use axum::{extract::State, response::IntoResponse, Json};
use rezdesk_core::models::UserClaims;
use rezdesk_services::ClaimsUpdate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetClaimsRequest {
    pub uid: Uuid,
    #[serde(rename = "platformRole")]
    pub platform_role: String,
    #[serde(rename = "roleCode")]
    pub role_code: i32,
    #[serde(rename = "providerId")]
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetClaimsResponse {
    pub success: bool,
    pub message: String,
    pub claims: UserClaims,
}

/// Replace a subject's authorization claims.
#[utoipa::path(
    post,
    path = "/api/v0/claims",
    tag = "claims",
    request_body = SetClaimsRequest,
    responses(
        (status = 200, description = "Claims replaced", body = SetClaimsResponse),
        (status = 400, description = "Invalid claims payload", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 403, description = "Credentials lack the claims grant", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, request), fields(actor = %actor.0.actor_id))]
pub async fn set_claims(
    State(services): State<ServiceState>,
    actor: AdminContext,
    ValidatedJson(request): ValidatedJson<SetClaimsRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let claims = services
        .claims
        .set_claims(ClaimsUpdate {
            uid: request.uid,
            platform_role: request.platform_role,
            role_code: request.role_code,
            provider_id: request.provider_id,
        })
        .await?;

    Ok(Json(SetClaimsResponse {
        success: true,
        message: format!("Claims updated for user {}", request.uid),
        claims,
    }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TriggerClaimsSyncRequest {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TriggerClaimsSyncResponse {
    pub success: bool,
    pub message: String,
}

/// Re-trigger the out-of-band claims sync for a subject.
#[utoipa::path(
    post,
    path = "/api/v0/claims/sync",
    tag = "claims",
    request_body = TriggerClaimsSyncRequest,
    responses(
        (status = 200, description = "Sync re-triggered", body = TriggerClaimsSyncResponse),
        (status = 400, description = "Unknown user", body = ErrorResponse),
        (status = 401, description = "Missing or invalid credentials", body = ErrorResponse),
        (status = 403, description = "Credentials lack the claims grant", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, request), fields(actor = %actor.0.actor_id))]
pub async fn trigger_claims_sync(
    State(services): State<ServiceState>,
    actor: AdminContext,
    ValidatedJson(request): ValidatedJson<TriggerClaimsSyncRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    services.claims.trigger_claims_sync(request.user_id).await?;

    Ok(Json(TriggerClaimsSyncResponse {
        success: true,
        message: format!("Claims sync re-triggered for user {}", request.user_id),
    }))
}
