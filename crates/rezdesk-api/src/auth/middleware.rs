//! Authentication middleware.
//!
//! Two layers, applied per route group:
//! - `admin_auth_middleware` guards the claims endpoints. Accepts machine
//!   credentials (`rzk_live_` prefix, introspected) or admin-tier user JWTs;
//!   the dispatch and fall-through live in `rezdesk_services::verify`.
//! - `user_auth_middleware` guards user-facing endpoints with an
//!   identity-provider JWT, without any role floor; role checks belong to the
//!   handlers and services behind it.

use crate::auth::models::{AdminContext, UserContext};
use crate::error::HttpAppError;
use crate::state::AuthState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use rezdesk_core::AppError;
use uuid::Uuid;

fn bearer_token(request: &Request) -> Result<&str, AppError> {
    let header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))
}

/// Admin credential gate for the claims endpoints.
pub async fn admin_auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token.to_string(),
        Err(err) => return HttpAppError(err).into_response(),
    };

    match auth.verifier.authorize(&token).await {
        Ok(actor) => {
            tracing::debug!(actor_id = %actor.actor_id, method = ?actor.method, "admin authorized");
            request.extensions_mut().insert(AdminContext(actor));
            next.run(request).await
        }
        Err(err) => HttpAppError(err).into_response(),
    }
}

/// User JWT gate for authenticated endpoints.
pub async fn user_auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(&request) {
        Ok(token) => token.to_string(),
        Err(err) => return HttpAppError(err).into_response(),
    };

    let claims = match auth.jwks.validate_token(&token).await {
        Ok(claims) => claims,
        Err(err) => return HttpAppError(err).into_response(),
    };

    let user_id = Uuid::parse_str(&claims.sub).ok();
    let provider_id = claims
        .provider_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id).ok());

    request.extensions_mut().insert(UserContext {
        subject: claims.sub,
        user_id,
        email: claims.email,
        role_code: claims.role_code.unwrap_or(0),
        provider_id,
    });

    next.run(request).await
}
