use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Identity record, one per end user.
///
/// Created either by invitation acceptance or by the external provisioner
/// working through the onboarding queue. The claims fields (`platform_role`,
/// `role_code`, `provider_id`) are mutated only by the claims writer; profile
/// fields belong to the owning user. Records are never deleted in-band.
///
/// `claims_sync_pending` marks the window between "user written" and "claims
/// confirmed" in the two-phase accept/claims handoff.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub first_names: String,
    pub surname: String,
    pub phone_number: Option<String>,
    pub id_number: Option<String>,
    pub platform_role: String,
    pub role_code: i32,
    pub provider_id: Option<Uuid>,
    pub is_active: bool,
    pub claims_sync_pending: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Authorization claims attached to a subject, as applied by the claims writer
/// and echoed back in API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserClaims {
    pub role: String,
    #[serde(rename = "roleCode")]
    pub role_code: i32,
    #[serde(rename = "providerId", skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<Uuid>,
}
