use rezdesk_core::models::UserAccount;
use rezdesk_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for identity records.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, AppError> {
        let row = sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, email, first_names, surname, phone_number, id_number,
                   platform_role, role_code, provider_id, is_active,
                   claims_sync_pending, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Lookup by email. Emails are stored lowercase; the argument is
    /// normalized here so callers can pass user input directly.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserAccount>, AppError> {
        let row = sqlx::query_as::<_, UserAccount>(
            r#"
            SELECT id, email, first_names, surname, phone_number, id_number,
                   platform_role, role_code, provider_id, is_active,
                   claims_sync_pending, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Create or overwrite the identity record for an accepted invitation.
    ///
    /// The record is written with `claims_sync_pending = true`; the claims
    /// writer clears the flag once the second phase of the accept handoff has
    /// landed.
    #[allow(clippy::too_many_arguments)]
    pub async fn upsert_from_invitation(
        &self,
        id: Uuid,
        email: &str,
        first_names: &str,
        surname: &str,
        phone_number: Option<&str>,
        id_number: Option<&str>,
        platform_role: &str,
        role_code: i32,
        provider_id: Uuid,
    ) -> Result<UserAccount, AppError> {
        let row = sqlx::query_as::<_, UserAccount>(
            r#"
            INSERT INTO users (
                id, email, first_names, surname, phone_number, id_number,
                platform_role, role_code, provider_id, is_active,
                claims_sync_pending
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, TRUE)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                first_names = EXCLUDED.first_names,
                surname = EXCLUDED.surname,
                phone_number = EXCLUDED.phone_number,
                id_number = EXCLUDED.id_number,
                platform_role = EXCLUDED.platform_role,
                role_code = EXCLUDED.role_code,
                provider_id = EXCLUDED.provider_id,
                claims_sync_pending = TRUE,
                updated_at = NOW()
            RETURNING id, email, first_names, surname, phone_number, id_number,
                      platform_role, role_code, provider_id, is_active,
                      claims_sync_pending, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(email.trim().to_lowercase())
        .bind(first_names)
        .bind(surname)
        .bind(phone_number)
        .bind(id_number)
        .bind(platform_role)
        .bind(role_code)
        .bind(provider_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Replace the subject's claims fields and clear the sync-pending marker.
    /// Fully replaces prior claims for these keys; idempotent by construction.
    pub async fn set_claims(
        &self,
        uid: Uuid,
        platform_role: &str,
        role_code: i32,
        provider_id: Option<Uuid>,
    ) -> Result<Option<UserAccount>, AppError> {
        let row = sqlx::query_as::<_, UserAccount>(
            r#"
            UPDATE users
            SET platform_role = $2,
                role_code = $3,
                provider_id = $4,
                claims_sync_pending = FALSE,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, first_names, surname, phone_number, id_number,
                      platform_role, role_code, provider_id, is_active,
                      claims_sync_pending, created_at, updated_at
            "#,
        )
        .bind(uid)
        .bind(platform_role)
        .bind(role_code)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Touch the record to re-trigger the out-of-band claims sync. Returns
    /// false when the subject does not exist.
    pub async fn touch_for_claims_sync(&self, uid: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET claims_sync_pending = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(uid)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
