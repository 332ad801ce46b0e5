use rezdesk_core::models::PendingStaff;
use rezdesk_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

const PENDING_STAFF_COLUMNS: &str = r#"
    id, email, first_names, surname, phone_number, id_number, street_address,
    city, postal_code, requested_role, role_code, provider_id, status,
    created_at, updated_at, created_at_iso, updated_at_iso
"#;

/// Repository for staff-registration drafts awaiting external provisioning.
///
/// A partial unique index on `(email) WHERE status = 'pending'` guarantees at
/// most one live draft per email; completed or failed drafts do not block a
/// new submission. Status transitions away from `pending` belong to the
/// external provisioner, never to this system.
#[derive(Clone)]
pub struct PendingStaffRepository {
    pool: PgPool,
}

impl PendingStaffRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a pending draft unless one already exists for the email.
    /// Returns `None` on conflict (caller maps to 409).
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_pending(
        &self,
        email: &str,
        first_names: &str,
        surname: &str,
        phone_number: Option<&str>,
        id_number: Option<&str>,
        street_address: Option<&str>,
        city: Option<&str>,
        postal_code: Option<&str>,
        requested_role: &str,
        role_code: i32,
        provider_id: Uuid,
    ) -> Result<Option<PendingStaff>, AppError> {
        // ISO-string twins exist purely for the automation platform, which
        // cannot parse timestamptz.
        let now = chrono::Utc::now();
        let now_iso = now.to_rfc3339();

        let row = sqlx::query_as::<_, PendingStaff>(&format!(
            r#"
            INSERT INTO pending_staff (
                id, email, first_names, surname, phone_number, id_number,
                street_address, city, postal_code, requested_role, role_code,
                provider_id, status, created_at, updated_at, created_at_iso,
                updated_at_iso
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                    'pending', $13, $13, $14, $14)
            ON CONFLICT (email) WHERE status = 'pending' DO NOTHING
            RETURNING {PENDING_STAFF_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(email.trim().to_lowercase())
        .bind(first_names)
        .bind(surname)
        .bind(phone_number)
        .bind(id_number)
        .bind(street_address)
        .bind(city)
        .bind(postal_code)
        .bind(requested_role)
        .bind(role_code)
        .bind(provider_id)
        .bind(now)
        .bind(now_iso)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Drafts for a provider, newest first.
    pub async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<PendingStaff>, AppError> {
        let rows = sqlx::query_as::<_, PendingStaff>(&format!(
            r#"
            SELECT {PENDING_STAFF_COLUMNS}
            FROM pending_staff
            WHERE provider_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(provider_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
