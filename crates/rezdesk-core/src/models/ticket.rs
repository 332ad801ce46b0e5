use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "ticket_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Synced,
    Closed,
}

/// Support ticket raised in-app and pushed to the external CRM through the
/// automation platform. `crm_ref` is set once the sync succeeds; a failed sync
/// leaves the ticket `open` for a later manual push.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Ticket {
    pub id: Uuid,
    pub provider_id: Option<Uuid>,
    pub raised_by: Uuid,
    pub subject: String,
    pub body: String,
    pub category: String,
    pub status: TicketStatus,
    pub crm_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
