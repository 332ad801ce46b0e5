pub mod claims;
pub mod funding;
pub mod invitations;
pub mod onboarding;
pub mod permissions;
pub mod tickets;

use crate::auth::models::UserContext;
use rezdesk_core::{AppError, PlatformRole};
use uuid::Uuid;

/// Resolve the provider a caller may read or write.
///
/// Admin-tier callers may name any provider (falling back to their own claim
/// if present); provider-tier callers are pinned to their own provider and a
/// mismatched `providerId` is refused rather than silently rewritten.
pub(crate) fn scoped_provider_id(
    ctx: &UserContext,
    requested: Option<Uuid>,
) -> Result<Uuid, AppError> {
    if ctx.role_code >= PlatformRole::Admin.code() {
        return requested
            .or(ctx.provider_id)
            .ok_or_else(|| AppError::InvalidInput("providerId is required".to_string()));
    }
    if ctx.role_code >= PlatformRole::ProviderStaff.code() {
        let own = ctx.provider_id.ok_or_else(|| {
            AppError::Forbidden("No provider associated with this account".to_string())
        })?;
        if let Some(requested) = requested {
            if requested != own {
                return Err(AppError::Forbidden(
                    "Cannot access another provider's data".to_string(),
                ));
            }
        }
        return Ok(own);
    }
    Err(AppError::Forbidden("Provider role required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role_code: i32, provider_id: Option<Uuid>) -> UserContext {
        UserContext {
            subject: Uuid::new_v4().to_string(),
            user_id: Some(Uuid::new_v4()),
            email: Some("caller@res.example".to_string()),
            role_code,
            provider_id,
        }
    }

    #[test]
    fn admins_may_name_any_provider() {
        let target = Uuid::new_v4();
        assert_eq!(
            scoped_provider_id(&ctx(3, None), Some(target)).unwrap(),
            target
        );
    }

    #[test]
    fn admins_without_a_provider_must_name_one() {
        assert!(matches!(
            scoped_provider_id(&ctx(4, None), None),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn provider_tier_is_pinned_to_its_own_provider() {
        let own = Uuid::new_v4();
        assert_eq!(scoped_provider_id(&ctx(2, Some(own)), None).unwrap(), own);
        assert_eq!(
            scoped_provider_id(&ctx(1, Some(own)), Some(own)).unwrap(),
            own
        );
        assert!(matches!(
            scoped_provider_id(&ctx(2, Some(own)), Some(Uuid::new_v4())),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn unprovisioned_callers_are_refused() {
        assert!(matches!(
            scoped_provider_id(&ctx(0, None), Some(Uuid::new_v4())),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            scoped_provider_id(&ctx(1, None), None),
            Err(AppError::Forbidden(_))
        ));
    }
}
