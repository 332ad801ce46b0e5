//! Onboarding queue handlers.
//!
//! Submission is public: the applicant has no account yet. Listing the queue
//! requires an authenticated provider-tier or admin caller.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::scoped_provider_id;
use crate::state::ServiceState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use rezdesk_core::models::PendingStaff;
use rezdesk_services::StaffRegistration;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterStaffRequest {
    pub email: String,
    #[serde(rename = "firstNames")]
    pub first_names: String,
    pub surname: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: Option<String>,
    #[serde(rename = "idNumber")]
    pub id_number: String,
    #[serde(rename = "streetAddress")]
    pub street_address: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "postalCode")]
    pub postal_code: Option<String>,
    #[serde(rename = "requestedRole")]
    pub requested_role: String,
    #[serde(rename = "providerId")]
    pub provider_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterStaffResponse {
    pub success: bool,
    #[serde(rename = "pendingUserId")]
    pub pending_user_id: Uuid,
    pub message: String,
}

/// Queue a staff registration for external provisioning.
#[utoipa::path(
    post,
    path = "/api/v0/onboarding",
    tag = "onboarding",
    request_body = RegisterStaffRequest,
    responses(
        (status = 200, description = "Registration queued", body = RegisterStaffResponse),
        (status = 400, description = "Invalid registration or unknown provider", body = ErrorResponse),
        (status = 409, description = "Account or pending registration already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(services, request))]
pub async fn register_staff(
    State(services): State<ServiceState>,
    ValidatedJson(request): ValidatedJson<RegisterStaffRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let draft = services
        .onboarding
        .submit(StaffRegistration {
            email: request.email,
            first_names: request.first_names,
            surname: request.surname,
            phone_number: request.phone_number,
            id_number: request.id_number,
            street_address: request.street_address,
            city: request.city,
            postal_code: request.postal_code,
            requested_role: request.requested_role,
            provider_id: request.provider_id,
        })
        .await?;

    Ok(Json(RegisterStaffResponse {
        success: true,
        pending_user_id: draft.id,
        message: "Registration received and queued for provisioning".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListOnboardingQuery {
    #[serde(rename = "providerId")]
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOnboardingResponse {
    pub success: bool,
    #[serde(rename = "pendingUsers")]
    pub pending_users: Vec<PendingStaff>,
}

/// List a provider's queued registrations, newest first.
#[utoipa::path(
    get,
    path = "/api/v0/onboarding",
    tag = "onboarding",
    params(
        ("providerId" = Option<Uuid>, Query, description = "Provider to list; defaults to the caller's provider")
    ),
    responses(
        (status = 200, description = "Queued registrations", body = ListOnboardingResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view this provider", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, ctx))]
pub async fn list_onboarding(
    State(services): State<ServiceState>,
    ctx: UserContext,
    Query(query): Query<ListOnboardingQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let provider_id = scoped_provider_id(&ctx, query.provider_id)?;
    let pending_users = services.onboarding.list(provider_id).await?;

    Ok(Json(ListOnboardingResponse {
        success: true,
        pending_users,
    }))
}
