//! Claims writer.
//!
//! Claims are the authorization facts stamped onto identity tokens: platform
//! role, numeric role code and (for provider-tier roles) the provider id.
//! Writes are full replacements and idempotent; re-applying the same claims
//! is a no-op apart from `updated_at`.

use rezdesk_core::models::{UserAccount, UserClaims};
use rezdesk_core::{AppError, PlatformRole};
use rezdesk_db::UserRepository;
use uuid::Uuid;

/// Claims update applied to one subject.
#[derive(Debug, Clone)]
pub struct ClaimsUpdate {
    pub uid: Uuid,
    pub platform_role: String,
    pub role_code: i32,
    pub provider_id: Option<Uuid>,
}

/// Validation for a claims update. First failure wins; each maps to 400.
pub fn validate_claims_update(update: &ClaimsUpdate) -> Result<(), AppError> {
    if update.platform_role.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "platformRole is required".to_string(),
        ));
    }
    match update.platform_role.as_str() {
        "admin" | "provider" => {}
        other => {
            return Err(AppError::InvalidInput(format!(
                "platformRole must be 'admin' or 'provider', got '{}'",
                other
            )))
        }
    }
    if update.platform_role == "provider" && update.provider_id.is_none() {
        return Err(AppError::InvalidInput(
            "providerId is required for the 'provider' role".to_string(),
        ));
    }
    Ok(())
}

/// Ladder role to persist for a claims update.
///
/// The identity record stores the fine-grained ladder name (`provider_staff`,
/// `provider_owner`, `admin`, `super_admin`) so `platform_role` and
/// `role_code` always correspond; the coarse claim role in the update must
/// agree with the code's tier or the update is rejected.
pub fn ladder_role_for_update(update: &ClaimsUpdate) -> Result<PlatformRole, AppError> {
    let ladder = PlatformRole::from_code(update.role_code).ok_or_else(|| {
        AppError::InvalidInput(format!("Unknown role code {}", update.role_code))
    })?;

    let coarse = if ladder >= PlatformRole::Admin {
        "admin"
    } else if ladder.is_provider_tier() {
        "provider"
    } else {
        return Err(AppError::InvalidInput(
            "roleCode 0 does not grant any platform role".to_string(),
        ));
    };

    if update.platform_role != coarse {
        return Err(AppError::InvalidInput(format!(
            "roleCode {} does not correspond to platformRole '{}'",
            update.role_code, update.platform_role
        )));
    }

    Ok(ladder)
}

#[derive(Clone)]
pub struct ClaimsService {
    users: UserRepository,
}

impl ClaimsService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Replace the subject's claims and clear the sync-pending marker.
    pub async fn set_claims(&self, update: ClaimsUpdate) -> Result<UserClaims, AppError> {
        validate_claims_update(&update)?;
        let ladder = ladder_role_for_update(&update)?;

        let account = self
            .users
            .set_claims(update.uid, ladder.as_str(), update.role_code, update.provider_id)
            .await?
            // An unknown subject is an integration fault, not client input:
            // present as a generic 500.
            .ok_or_else(|| {
                AppError::Internal(format!("no identity record for subject {}", update.uid))
            })?;

        tracing::info!(
            uid = %account.id,
            role = %account.platform_role,
            role_code = account.role_code,
            "claims replaced"
        );

        // Tokens carry the coarse role; the record keeps the ladder name.
        Ok(UserClaims {
            role: update.platform_role,
            role_code: account.role_code,
            provider_id: account.provider_id,
        })
    }

    /// Re-trigger the out-of-band claims sync for a subject.
    pub async fn trigger_claims_sync(&self, user_id: Uuid) -> Result<(), AppError> {
        let touched = self.users.touch_for_claims_sync(user_id).await?;
        if !touched {
            return Err(AppError::BadRequest(format!(
                "No identity record for user {}",
                user_id
            )));
        }
        tracing::info!(uid = %user_id, "claims sync re-triggered");
        Ok(())
    }

    pub async fn get_account(&self, uid: Uuid) -> Result<Option<UserAccount>, AppError> {
        self.users.get_by_id(uid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(role: &str, provider_id: Option<Uuid>) -> ClaimsUpdate {
        ClaimsUpdate {
            uid: Uuid::new_v4(),
            platform_role: role.to_string(),
            role_code: 2,
            provider_id,
        }
    }

    #[test]
    fn admin_claims_need_no_provider() {
        assert!(validate_claims_update(&update("admin", None)).is_ok());
    }

    #[test]
    fn provider_claims_require_provider_id() {
        let err = validate_claims_update(&update("provider", None)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(validate_claims_update(&update("provider", Some(Uuid::new_v4()))).is_ok());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let err = validate_claims_update(&update("superuser", None)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn empty_role_reported_before_membership_check() {
        let err = validate_claims_update(&update("  ", None)).unwrap_err();
        match err {
            AppError::InvalidInput(msg) => assert_eq!(msg, "platformRole is required"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn coded_update(role: &str, role_code: i32) -> ClaimsUpdate {
        ClaimsUpdate {
            uid: Uuid::new_v4(),
            platform_role: role.to_string(),
            role_code,
            provider_id: Some(Uuid::new_v4()),
        }
    }

    #[test]
    fn provider_codes_map_to_ladder_names() {
        assert_eq!(
            ladder_role_for_update(&coded_update("provider", 1)).unwrap(),
            PlatformRole::ProviderStaff
        );
        assert_eq!(
            ladder_role_for_update(&coded_update("provider", 2)).unwrap(),
            PlatformRole::ProviderOwner
        );
    }

    #[test]
    fn admin_codes_map_to_ladder_names() {
        assert_eq!(
            ladder_role_for_update(&coded_update("admin", 3)).unwrap(),
            PlatformRole::Admin
        );
        assert_eq!(
            ladder_role_for_update(&coded_update("admin", 4)).unwrap(),
            PlatformRole::SuperAdmin
        );
    }

    #[test]
    fn mismatched_role_and_code_are_rejected() {
        let err = ladder_role_for_update(&coded_update("provider", 3)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        let err = ladder_role_for_update(&coded_update("admin", 1)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn codes_outside_the_ladder_are_rejected() {
        let err = ladder_role_for_update(&coded_update("provider", 0)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        let err = ladder_role_for_update(&coded_update("admin", 9)).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
