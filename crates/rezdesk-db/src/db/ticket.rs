use rezdesk_core::models::Ticket;
use rezdesk_core::AppError;
use sqlx::PgPool;
use uuid::Uuid;

const TICKET_COLUMNS: &str = r#"
    id, provider_id, raised_by, subject, body, category, status, crm_ref,
    created_at, updated_at
"#;

/// Repository for support tickets.
#[derive(Clone)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        provider_id: Option<Uuid>,
        raised_by: Uuid,
        subject: &str,
        body: &str,
        category: &str,
    ) -> Result<Ticket, AppError> {
        let row = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            INSERT INTO tickets (id, provider_id, raised_by, subject, body,
                                 category, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'open')
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(provider_id)
        .bind(raised_by)
        .bind(subject)
        .bind(body)
        .bind(category)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Record a successful CRM push. A ticket already closed stays closed.
    pub async fn mark_synced(&self, id: Uuid, crm_ref: &str) -> Result<Option<Ticket>, AppError> {
        let row = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            UPDATE tickets
            SET status = 'synced', crm_ref = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING {TICKET_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(crm_ref)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<Ticket>, AppError> {
        let rows = sqlx::query_as::<_, Ticket>(&format!(
            r#"
            SELECT {TICKET_COLUMNS}
            FROM tickets
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
