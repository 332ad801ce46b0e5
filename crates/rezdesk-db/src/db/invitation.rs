use chrono::{DateTime, Utc};
use rezdesk_core::models::Invitation;
use rezdesk_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

const INVITATION_COLUMNS: &str = r#"
    id, token, email, assigned_role, role_code, provider_id, provider_name,
    invited_by, invited_by_name, invited_by_email, status, created_at,
    expires_at, accepted_at, accepted_by, revoked_at
"#;

/// Repository for invitation tokens.
///
/// The invitations table carries a partial unique index on
/// `(email, provider_id) WHERE status = 'pending'`, so "one live pending
/// invitation per email and provider" is a database guarantee rather than a
/// read-then-write check.
#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending invitation if no live pending one exists for the same
    /// email and provider. Returns `None` on conflict (caller maps to 409).
    #[allow(clippy::too_many_arguments)]
    pub async fn create_pending(
        &self,
        token: &str,
        email: &str,
        assigned_role: &str,
        role_code: i32,
        provider_id: Uuid,
        provider_name: Option<&str>,
        invited_by: Uuid,
        invited_by_name: Option<&str>,
        invited_by_email: Option<&str>,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<Invitation>, AppError> {
        let row = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            INSERT INTO invitations (
                id, token, email, assigned_role, role_code, provider_id,
                provider_name, invited_by, invited_by_name, invited_by_email,
                status, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending', $11)
            ON CONFLICT (email, provider_id) WHERE status = 'pending' DO NOTHING
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(token)
        .bind(email.trim().to_lowercase())
        .bind(assigned_role)
        .bind(role_code)
        .bind(provider_id)
        .bind(provider_name)
        .bind(invited_by)
        .bind(invited_by_name)
        .bind(invited_by_email)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        let row = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE token = $1
            "#
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// All invitations for a provider, newest first. No pagination: the set is
    /// small (staff of one provider).
    pub async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<Invitation>, AppError> {
        let rows = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            SELECT {INVITATION_COLUMNS}
            FROM invitations
            WHERE provider_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Conditionally finalize acceptance: only a stored-pending invitation
    /// transitions, so the first concurrent accept wins and later ones see
    /// `None`.
    pub async fn mark_accepted(
        &self,
        token: &str,
        accepted_by: Uuid,
    ) -> Result<Option<Invitation>, AppError> {
        let row = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            UPDATE invitations
            SET status = 'accepted', accepted_at = NOW(), accepted_by = $2
            WHERE token = $1 AND status = 'pending'
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(accepted_by)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Conditionally revoke a pending invitation.
    pub async fn mark_revoked(&self, token: &str) -> Result<Option<Invitation>, AppError> {
        let row = sqlx::query_as::<_, Invitation>(&format!(
            r#"
            UPDATE invitations
            SET status = 'revoked', revoked_at = NOW()
            WHERE token = $1 AND status = 'pending'
            RETURNING {INVITATION_COLUMNS}
            "#
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Persist the expired state once an accept or revoke has been attempted
    /// against a lapsed invitation. Until that point expiry stays a read-time
    /// computation.
    pub async fn mark_expired(&self, token: &str) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE invitations
            SET status = 'expired'
            WHERE token = $1 AND status = 'pending' AND expires_at < NOW()
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
