use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Processing state of a staff-registration draft. Only `pending` is ever
/// written by this system; the external provisioner owns the rest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "onboarding_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Staff-registration draft awaiting external provisioning.
///
/// Timestamps are stored twice: natively for this system and as ISO-8601
/// strings for the automation platform, which cannot parse the native type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PendingStaff {
    pub id: Uuid,
    pub email: String,
    pub first_names: String,
    pub surname: String,
    pub phone_number: Option<String>,
    pub id_number: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub requested_role: String,
    pub role_code: i32,
    pub provider_id: Uuid,
    pub status: OnboardingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_at_iso: String,
    pub updated_at_iso: String,
}
