use crate::error::ErrorResponse;
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};
use axum::Json;
use rezdesk_services::AdminActor;
use uuid::Uuid;

/// Verified admin-tier caller (machine credential or admin user token),
/// stored in request extensions by the admin auth middleware.
#[derive(Debug, Clone)]
pub struct AdminContext(pub AdminActor);

impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new(
                        "Missing admin credentials",
                        "UNAUTHORIZED",
                    )),
                )
            })
    }
}

/// Verified end-user caller, extracted from an identity-provider JWT and
/// stored in request extensions by the user auth middleware.
#[derive(Debug, Clone)]
pub struct UserContext {
    /// Raw token subject.
    pub subject: String,
    /// Subject parsed as a UUID; present for all accounts this system issues.
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub role_code: i32,
    pub provider_id: Option<Uuid>,
}

impl UserContext {
    /// The subject as a UUID, required by endpoints that write on the user's
    /// behalf.
    pub fn require_user_id(&self) -> Result<Uuid, rezdesk_core::AppError> {
        self.user_id.ok_or_else(|| {
            rezdesk_core::AppError::Unauthorized("Token subject is not a valid user id".to_string())
        })
    }
}

impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserContext>()
            .cloned()
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new("Missing user context", "UNAUTHORIZED")),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_user_id_rejects_non_uuid_subjects() {
        let ctx = UserContext {
            subject: "svc-account".to_string(),
            user_id: None,
            email: None,
            role_code: 2,
            provider_id: None,
        };
        assert!(ctx.require_user_id().is_err());

        let id = Uuid::new_v4();
        let ctx = UserContext {
            subject: id.to_string(),
            user_id: Some(id),
            email: None,
            role_code: 2,
            provider_id: None,
        };
        assert_eq!(ctx.require_user_id().unwrap(), id);
    }
}
