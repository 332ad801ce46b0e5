//! Test fixtures: provider and identity rows, plus invitation issuance
//! through the service layer.

use rezdesk_api::state::AppState;
use rezdesk_core::PlatformRole;
use rezdesk_services::{CreateInvitation, CreatedInvitation};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Insert an active provider and return its id.
pub async fn create_provider(pool: &PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO providers (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await
        .expect("Failed to insert provider");
    id
}

/// Insert an identity record and return its id.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    role: PlatformRole,
    provider_id: Option<Uuid>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (id, email, first_names, surname, platform_role, role_code, provider_id)
        VALUES ($1, $2, 'Test', 'User', $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(role.as_str())
    .bind(role.code())
    .bind(provider_id)
    .execute(pool)
    .await
    .expect("Failed to insert user");
    id
}

/// Issue an invitation through the service, as an admin inviter.
pub async fn issue_invitation(
    state: &Arc<AppState>,
    provider_id: Uuid,
    email: &str,
    role: PlatformRole,
) -> CreatedInvitation {
    state
        .services
        .invitations
        .create(CreateInvitation {
            email: email.to_string(),
            assigned_role: role.as_str().to_string(),
            provider_id,
            invited_by: Uuid::new_v4(),
            invited_by_name: Some("Platform Admin".to_string()),
            invited_by_email: Some("admin@test.invalid".to_string()),
            inviter_role_code: PlatformRole::Admin.code(),
        })
        .await
        .expect("Failed to issue invitation")
}

/// Extract the raw token from an invite URL (`.../invite/{token}`).
pub fn invite_token(invite_url: &str) -> &str {
    invite_url
        .rsplit('/')
        .next()
        .expect("invite URL has no token segment")
}
