//! RBAC resolution.
//!
//! The decision is a pure function over `(role_code, staff assignment,
//! permission matrix)`; the service wraps it with the per-request lookups.
//! Platform roles at admin tier and provider owners hold every key (tenant
//! scoping is enforced by data queries, not permission keys); provider staff
//! need an active assignment whose matrix entry grants the key.

use rezdesk_core::models::{PermissionMatrix, StaffAssignment};
use rezdesk_core::{AppError, PlatformRole};
use rezdesk_db::{PermissionMatrixRepository, StaffAssignmentRepository};
use std::collections::HashMap;
use uuid::Uuid;

/// Whether a subject holds one permission key.
pub fn has_permission(
    role_code: i32,
    assignment: Option<&StaffAssignment>,
    matrix: &PermissionMatrix,
    key: &str,
) -> bool {
    if role_code >= PlatformRole::Admin.code() {
        return true;
    }
    if role_code == PlatformRole::ProviderOwner.code() {
        return true;
    }
    if role_code == PlatformRole::ProviderStaff.code() {
        let Some(assignment) = assignment else {
            return false;
        };
        if !assignment.is_active() {
            return false;
        }
        return matrix
            .permissions_for(&assignment.provider_role)
            .map(|perms| perms.iter().any(|p| p == key))
            .unwrap_or(false);
    }
    false
}

pub fn has_any(
    role_code: i32,
    assignment: Option<&StaffAssignment>,
    matrix: &PermissionMatrix,
    keys: &[&str],
) -> bool {
    keys.iter()
        .any(|key| has_permission(role_code, assignment, matrix, key))
}

pub fn has_all(
    role_code: i32,
    assignment: Option<&StaffAssignment>,
    matrix: &PermissionMatrix,
    keys: &[&str],
) -> bool {
    keys.iter()
        .all(|key| has_permission(role_code, assignment, matrix, key))
}

#[derive(Clone)]
pub struct RbacService {
    matrix: PermissionMatrixRepository,
    assignments: StaffAssignmentRepository,
}

impl RbacService {
    pub fn new(matrix: PermissionMatrixRepository, assignments: StaffAssignmentRepository) -> Self {
        Self { matrix, assignments }
    }

    /// Decide a set of permission keys for one subject. Lookups run only when
    /// the ladder needs them: codes above staff tier decide without touching
    /// the database.
    pub async fn check(
        &self,
        user_id: Uuid,
        role_code: i32,
        provider_id: Option<Uuid>,
        keys: &[String],
    ) -> Result<HashMap<String, bool>, AppError> {
        if role_code >= PlatformRole::ProviderOwner.code() {
            return Ok(keys.iter().map(|k| (k.clone(), true)).collect());
        }
        if role_code < PlatformRole::ProviderStaff.code() {
            return Ok(keys.iter().map(|k| (k.clone(), false)).collect());
        }

        let assignment = match provider_id {
            Some(provider_id) => self.assignments.get_for_user(user_id, provider_id).await?,
            None => None,
        };
        let matrix = self.matrix.get_matrix().await?;

        Ok(keys
            .iter()
            .map(|key| {
                (
                    key.clone(),
                    has_permission(role_code, assignment.as_ref(), &matrix, key),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rezdesk_core::models::ProviderRolePermissions;

    fn matrix() -> PermissionMatrix {
        let mut roles = HashMap::new();
        roles.insert(
            "caretaker".to_string(),
            ProviderRolePermissions {
                label: "Caretaker".to_string(),
                permissions: vec!["rooms.view".to_string(), "maintenance.create".to_string()],
            },
        );
        PermissionMatrix { roles }
    }

    fn assignment(provider_role: &str, status: &str) -> StaffAssignment {
        StaffAssignment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            provider_role: provider_role.to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn admin_tier_bypasses_the_matrix() {
        let empty = PermissionMatrix::default();
        assert!(has_permission(4, None, &empty, "anything.at_all"));
        assert!(has_permission(3, None, &empty, "anything.at_all"));
    }

    #[test]
    fn provider_owner_holds_every_key() {
        assert!(has_permission(2, None, &PermissionMatrix::default(), "rooms.delete"));
    }

    #[test]
    fn staff_without_assignment_is_denied() {
        assert!(!has_permission(1, None, &matrix(), "rooms.view"));
    }

    #[test]
    fn staff_with_inactive_assignment_is_denied() {
        let a = assignment("caretaker", "suspended");
        assert!(!has_permission(1, Some(&a), &matrix(), "rooms.view"));
    }

    #[test]
    fn staff_grant_requires_matrix_entry_containing_the_key() {
        let a = assignment("caretaker", "active");
        let m = matrix();
        assert!(has_permission(1, Some(&a), &m, "rooms.view"));
        assert!(!has_permission(1, Some(&a), &m, "billing.view"));
        let unknown_role = assignment("gardener", "active");
        assert!(!has_permission(1, Some(&unknown_role), &m, "rooms.view"));
    }

    #[test]
    fn role_code_zero_is_denied_everything() {
        let a = assignment("caretaker", "active");
        assert!(!has_permission(0, Some(&a), &matrix(), "rooms.view"));
    }

    #[test]
    fn any_and_all_lift_the_single_decision() {
        let a = assignment("caretaker", "active");
        let m = matrix();
        assert!(has_any(1, Some(&a), &m, &["billing.view", "rooms.view"]));
        assert!(!has_all(1, Some(&a), &m, &["billing.view", "rooms.view"]));
        assert!(has_all(
            1,
            Some(&a),
            &m,
            &["maintenance.create", "rooms.view"]
        ));
    }
}
