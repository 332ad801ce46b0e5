use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Permissions granted to one provider-scoped role key.
///
/// Permission keys are opaque `resource.action` strings; this layer never
/// interprets them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderRolePermissions {
    pub label: String,
    pub permissions: Vec<String>,
}

/// The single global role-to-permissions mapping, maintained out of band by
/// administrators and read by the RBAC resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PermissionMatrix {
    pub roles: HashMap<String, ProviderRolePermissions>,
}

impl PermissionMatrix {
    /// Permission set for a provider-role key, if the key is recognized.
    pub fn permissions_for(&self, provider_role: &str) -> Option<&[String]> {
        self.roles
            .get(provider_role)
            .map(|r| r.permissions.as_slice())
    }
}

/// Per-provider staff assignment: which provider-role a staff member (role
/// code 1) holds inside their provider, and whether it is currently active.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StaffAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub provider_role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffAssignment {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}
