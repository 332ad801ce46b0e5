//! Platform role ladder.
//!
//! Authority is ranked by a numeric role code 0-4. The code and the role name
//! must always correspond per this module's fixed mapping; everything that
//! persists or checks roles goes through `PlatformRole` rather than comparing
//! raw strings or integers.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Platform-wide role, ordered by authority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlatformRole {
    None,
    ProviderStaff,
    ProviderOwner,
    Admin,
    SuperAdmin,
}

impl PlatformRole {
    /// Numeric role code as stored on identity records and tokens.
    pub fn code(self) -> i32 {
        match self {
            PlatformRole::None => 0,
            PlatformRole::ProviderStaff => 1,
            PlatformRole::ProviderOwner => 2,
            PlatformRole::Admin => 3,
            PlatformRole::SuperAdmin => 4,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(PlatformRole::None),
            1 => Some(PlatformRole::ProviderStaff),
            2 => Some(PlatformRole::ProviderOwner),
            3 => Some(PlatformRole::Admin),
            4 => Some(PlatformRole::SuperAdmin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlatformRole::None => "none",
            PlatformRole::ProviderStaff => "provider_staff",
            PlatformRole::ProviderOwner => "provider_owner",
            PlatformRole::Admin => "admin",
            PlatformRole::SuperAdmin => "super_admin",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(PlatformRole::None),
            "provider_staff" => Some(PlatformRole::ProviderStaff),
            "provider_owner" => Some(PlatformRole::ProviderOwner),
            "admin" => Some(PlatformRole::Admin),
            "super_admin" => Some(PlatformRole::SuperAdmin),
            _ => None,
        }
    }

    /// Human-readable label, resolved when returning invitation details.
    pub fn label(self) -> &'static str {
        match self {
            PlatformRole::None => "No access",
            PlatformRole::ProviderStaff => "Provider staff",
            PlatformRole::ProviderOwner => "Provider owner",
            PlatformRole::Admin => "Platform administrator",
            PlatformRole::SuperAdmin => "Super administrator",
        }
    }

    /// Provider-tier roles are scoped to exactly one accommodation provider.
    /// Identity records with these roles must carry a provider id.
    pub fn is_provider_tier(self) -> bool {
        matches!(self, PlatformRole::ProviderStaff | PlatformRole::ProviderOwner)
    }

    /// Whether a holder of this role may grant `target` via invitation.
    ///
    /// Inviters can only grant strictly lower roles than their own, and must be
    /// at least a provider owner to invite anyone.
    pub fn can_invite(self, target: PlatformRole) -> bool {
        self >= PlatformRole::ProviderOwner && self > target
    }
}

impl Display for PlatformRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse role code for a free-text role label on a staff-registration form.
/// Unrecognized labels default to provider staff (code 1).
pub fn role_code_for_label(label: &str) -> i32 {
    match label.trim().to_lowercase().as_str() {
        "owner" | "provider owner" | "property owner" => PlatformRole::ProviderOwner.code(),
        "manager" | "property manager" | "residence manager" => PlatformRole::ProviderOwner.code(),
        "admin" | "administrator" => PlatformRole::Admin.code(),
        _ => PlatformRole::ProviderStaff.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_names_round_trip() {
        for code in 0..=4 {
            let role = PlatformRole::from_code(code).unwrap();
            assert_eq!(role.code(), code);
            assert_eq!(PlatformRole::from_name(role.as_str()), Some(role));
        }
        assert_eq!(PlatformRole::from_code(5), None);
        assert_eq!(PlatformRole::from_name("landlord"), None);
    }

    #[test]
    fn invitation_hierarchy_full_grid() {
        // Creation succeeds iff inviter > target AND inviter >= provider owner.
        for inviter_code in 0..=4 {
            for target_code in 0..=4 {
                let inviter = PlatformRole::from_code(inviter_code).unwrap();
                let target = PlatformRole::from_code(target_code).unwrap();
                let expected = inviter_code > target_code && inviter_code >= 2;
                assert_eq!(
                    inviter.can_invite(target),
                    expected,
                    "inviter {} target {}",
                    inviter_code,
                    target_code
                );
            }
        }
    }

    #[test]
    fn provider_tier_requires_tenant() {
        assert!(PlatformRole::ProviderStaff.is_provider_tier());
        assert!(PlatformRole::ProviderOwner.is_provider_tier());
        assert!(!PlatformRole::Admin.is_provider_tier());
        assert!(!PlatformRole::None.is_provider_tier());
    }

    #[test]
    fn unknown_labels_default_to_staff() {
        assert_eq!(role_code_for_label("Property Manager"), 2);
        assert_eq!(role_code_for_label("administrator"), 3);
        assert_eq!(role_code_for_label("Cleaner"), 1);
        assert_eq!(role_code_for_label(""), 1);
    }
}
