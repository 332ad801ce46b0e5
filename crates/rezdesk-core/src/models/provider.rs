use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Provider status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "provider_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    Active,
    Suspended,
}

/// Accommodation-provider organization (the tenant). Staff and owners are
/// scoped to exactly one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Provider {
    pub id: Uuid,
    pub name: String,
    pub status: ProviderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
