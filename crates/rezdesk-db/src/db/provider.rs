use rezdesk_core::models::Provider;
use rezdesk_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for accommodation providers. Providers are created out of band;
/// this service only reads them to validate invitation and onboarding scope.
#[derive(Clone)]
pub struct ProviderRepository {
    pool: PgPool,
}

impl ProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Provider>, AppError> {
        let row = sqlx::query_as::<_, Provider>(
            r#"
            SELECT id, name, status, created_at, updated_at
            FROM providers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
