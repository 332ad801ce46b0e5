//! Permission-check handler.
//!
//! Decides a batch of permission keys for the calling user in one request so
//! the frontend can gate its UI without a round trip per key.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::ServiceState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use rezdesk_core::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Debug, Deserialize)]
pub struct CheckPermissionsQuery {
    /// Comma-separated permission keys, e.g. `rooms.view,maintenance.create`.
    pub keys: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckPermissionsResponse {
    pub success: bool,
    pub permissions: HashMap<String, bool>,
}

/// Decide a set of permission keys for the calling user.
#[utoipa::path(
    get,
    path = "/api/v0/permissions/check",
    tag = "permissions",
    params(
        ("keys" = String, Query, description = "Comma-separated permission keys")
    ),
    responses(
        (status = 200, description = "Decision per key", body = CheckPermissionsResponse),
        (status = 400, description = "No keys supplied", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, ctx))]
pub async fn check_permissions(
    State(services): State<ServiceState>,
    ctx: UserContext,
    Query(query): Query<CheckPermissionsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let keys: Vec<String> = query
        .keys
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    if keys.is_empty() {
        return Err(HttpAppError(AppError::InvalidInput(
            "At least one permission key is required".to_string(),
        )));
    }

    let user_id = ctx.require_user_id()?;
    let permissions = services
        .rbac
        .check(user_id, ctx.role_code, ctx.provider_id, &keys)
        .await?;

    Ok(Json(CheckPermissionsResponse {
        success: true,
        permissions,
    }))
}
