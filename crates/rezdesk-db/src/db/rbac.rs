use rezdesk_core::models::{PermissionMatrix, StaffAssignment};
use rezdesk_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for the global role-to-permissions mapping.
///
/// The matrix lives in a single jsonb row keyed `'global'` and is maintained
/// out of band by administrators; this service only reads it.
#[derive(Clone)]
pub struct PermissionMatrixRepository {
    pool: PgPool,
}

impl PermissionMatrixRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The current matrix. A missing row is treated as an empty matrix so a
    /// fresh deployment denies provider-staff permissions instead of erroring.
    pub async fn get_matrix(&self) -> Result<PermissionMatrix, AppError> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            r#"
            SELECT roles
            FROM permission_matrix
            WHERE key = 'global'
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((roles,)) => {
                let roles = serde_json::from_value(roles)?;
                Ok(PermissionMatrix { roles })
            }
            None => Ok(PermissionMatrix::default()),
        }
    }
}

/// Repository for per-provider staff assignments.
#[derive(Clone)]
pub struct StaffAssignmentRepository {
    pool: PgPool,
}

impl StaffAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The staff member's assignment inside a provider, if any. Activity is
    /// the caller's check: an inactive assignment still resolves here.
    pub async fn get_for_user(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
    ) -> Result<Option<StaffAssignment>, AppError> {
        let row = sqlx::query_as::<_, StaffAssignment>(
            r#"
            SELECT id, user_id, provider_id, provider_role, status,
                   created_at, updated_at
            FROM staff_assignments
            WHERE user_id = $1 AND provider_id = $2
            "#,
        )
        .bind(user_id)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
