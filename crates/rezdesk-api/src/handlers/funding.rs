//! NSFAS funding verification handler.
//!
//! Thin pass-through to the automation platform's funding flow. The ID number
//! is validated locally first so obviously malformed input never leaves the
//! system.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::ServiceState;
use axum::{extract::State, response::IntoResponse, Json};
use rezdesk_core::validation::{validate_email, validate_sa_id_number};
use rezdesk_core::AppError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyFundingRequest {
    #[serde(rename = "idNumber")]
    pub id_number: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyFundingResponse {
    pub success: bool,
    pub funded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Verify a student's NSFAS funding status.
#[utoipa::path(
    post,
    path = "/api/v0/funding/verify",
    tag = "funding",
    request_body = VerifyFundingRequest,
    responses(
        (status = 200, description = "Funding status", body = VerifyFundingResponse),
        (status = 400, description = "Invalid ID number or email", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Verification unavailable", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, _ctx, request))]
pub async fn verify_funding(
    State(services): State<ServiceState>,
    _ctx: UserContext,
    ValidatedJson(request): ValidatedJson<VerifyFundingRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !validate_email(&request.email) {
        return Err(HttpAppError(AppError::InvalidInput(
            "A valid email address is required".to_string(),
        )));
    }
    validate_sa_id_number(&request.id_number)
        .map_err(|e| HttpAppError(AppError::InvalidInput(e.to_string())))?;

    let funding = services.funding.as_ref().ok_or_else(|| {
        HttpAppError(AppError::Upstream(
            "funding verification is not configured".to_string(),
        ))
    })?;

    let verification = funding
        .verify_funding(&request.id_number, &request.email)
        .await?;

    Ok(Json(VerifyFundingResponse {
        success: true,
        funded: verification.funded,
        reference: verification.reference,
    }))
}
