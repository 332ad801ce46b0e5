use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Invitation validity window: 7 days from creation.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Stored invitation status.
///
/// `Expired` is persisted only when an accept or revoke is attempted against a
/// lapsed invitation; until then expiry is a read-time computation over
/// `expires_at` (see [`effective_status`]).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "invitation_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

/// Single-use, time-boxed grant of one role within one provider to one email.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invitation {
    pub id: Uuid,
    /// Opaque secret: 32 CSPRNG bytes, hex-encoded (64 chars). Never included
    /// in fetch responses.
    pub token: String,
    pub email: String,
    pub assigned_role: String,
    pub role_code: i32,
    pub provider_id: Uuid,
    pub provider_name: Option<String>,
    pub invited_by: Uuid,
    pub invited_by_name: Option<String>,
    pub invited_by_email: Option<String>,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub accepted_by: Option<Uuid>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Invitation {
    pub fn expiry_for(created_at: DateTime<Utc>) -> DateTime<Utc> {
        created_at + Duration::days(INVITATION_TTL_DAYS)
    }
}

/// The state an invitation is observed in at `now`, independent of what is
/// stored. A pending invitation past its expiry reads as expired without any
/// write to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveStatus {
    Pending,
    Accepted,
    Expired,
    Revoked,
}

/// Pure state-transition overlay, invoked at every read/accept/revoke boundary.
pub fn effective_status(invitation: &Invitation, now: DateTime<Utc>) -> EffectiveStatus {
    match invitation.status {
        InvitationStatus::Accepted => EffectiveStatus::Accepted,
        InvitationStatus::Revoked => EffectiveStatus::Revoked,
        InvitationStatus::Expired => EffectiveStatus::Expired,
        InvitationStatus::Pending => {
            if now > invitation.expires_at {
                EffectiveStatus::Expired
            } else {
                EffectiveStatus::Pending
            }
        }
    }
}
