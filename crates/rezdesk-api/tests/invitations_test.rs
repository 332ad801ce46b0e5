//! Invitation lifecycle over HTTP: issue, fetch, accept, and the failure
//! modes the accept page depends on.

mod helpers;

use axum::http::StatusCode;
use helpers::{api_path, fixtures, setup_test_app};
use rezdesk_core::PlatformRole;
use serde_json::{json, Value};
use uuid::Uuid;

fn accept_body(token: &str, user_id: Uuid, email: &str) -> Value {
    json!({
        "token": token,
        "userId": user_id,
        "email": email,
        "firstNames": "Thandi",
        "surname": "Nkosi",
        "phoneNumber": "+27821234567",
    })
}

#[tokio::test]
async fn invitation_flow_from_issue_to_accept() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    let created = fixtures::issue_invitation(
        &app.state,
        provider_id,
        "staff@res.example",
        PlatformRole::ProviderStaff,
    )
    .await;
    let token = fixtures::invite_token(&created.invite_url);

    let response = app
        .client()
        .get(&api_path(&format!("/invitations/{}", token)))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["invitation"]["email"], "staff@res.example");
    assert_eq!(body["invitation"]["assignedRole"], "provider_staff");
    assert_eq!(body["invitation"]["providerName"], "Sunnyside Residence");

    let user_id = Uuid::new_v4();
    let response = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&accept_body(token, user_id, "staff@res.example"))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["claimsData"]["role"], "provider");
    assert_eq!(body["claimsData"]["roleCode"], 1);
    assert_eq!(body["claimsData"]["providerId"], json!(provider_id));

    // The identity record is written with the handoff still pending.
    let (platform_role, sync_pending): (String, bool) = sqlx::query_as(
        "SELECT platform_role, claims_sync_pending FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_one(app.pool())
    .await
    .expect("accepted user row must exist");
    assert_eq!(platform_role, "provider_staff");
    assert!(sync_pending);
}

#[tokio::test]
async fn accept_is_single_use() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    let created = fixtures::issue_invitation(
        &app.state,
        provider_id,
        "staff@res.example",
        PlatformRole::ProviderStaff,
    )
    .await;
    let token = fixtures::invite_token(&created.invite_url);

    let first = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&accept_body(token, Uuid::new_v4(), "staff@res.example"))
        .await;
    first.assert_status_ok();

    // A repeat accept, even from a different subject, is gone.
    let second = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&accept_body(token, Uuid::new_v4(), "staff@res.example"))
        .await;
    second.assert_status(StatusCode::GONE);
}

#[tokio::test]
async fn accept_matches_email_case_insensitively() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    let created = fixtures::issue_invitation(
        &app.state,
        provider_id,
        "user@res.example",
        PlatformRole::ProviderStaff,
    )
    .await;
    let token = fixtures::invite_token(&created.invite_url);

    let response = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&accept_body(token, Uuid::new_v4(), "User@Res.Example"))
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn accept_with_wrong_email_is_forbidden() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    let created = fixtures::issue_invitation(
        &app.state,
        provider_id,
        "staff@res.example",
        PlatformRole::ProviderStaff,
    )
    .await;
    let token = fixtures::invite_token(&created.invite_url);

    let response = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&accept_body(token, Uuid::new_v4(), "intruder@res.example"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_token_is_not_found() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&api_path(&format!("/invitations/{}", "0".repeat(64))))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn accept_for_email_owned_by_another_account_conflicts() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    // The email already belongs to a different subject.
    fixtures::create_user(
        app.pool(),
        "staff@res.example",
        PlatformRole::ProviderStaff,
        Some(provider_id),
    )
    .await;
    let created = fixtures::issue_invitation(
        &app.state,
        provider_id,
        "staff@res.example",
        PlatformRole::ProviderStaff,
    )
    .await;
    let token = fixtures::invite_token(&created.invite_url);

    let response = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&accept_body(token, Uuid::new_v4(), "staff@res.example"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn lapsed_invitation_is_gone_and_materialized_on_accept() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    let created = fixtures::issue_invitation(
        &app.state,
        provider_id,
        "staff@res.example",
        PlatformRole::ProviderStaff,
    )
    .await;
    let token = fixtures::invite_token(&created.invite_url);

    sqlx::query("UPDATE invitations SET expires_at = NOW() - INTERVAL '1 day' WHERE token = $1")
        .bind(token)
        .execute(app.pool())
        .await
        .expect("Failed to backdate invitation");

    let response = app
        .client()
        .get(&api_path(&format!("/invitations/{}", token)))
        .await;
    response.assert_status(StatusCode::GONE);

    let response = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&accept_body(token, Uuid::new_v4(), "staff@res.example"))
        .await;
    response.assert_status(StatusCode::GONE);

    // The accept path persists the computed expiry.
    let (status,): (String,) =
        sqlx::query_as("SELECT status::text FROM invitations WHERE token = $1")
            .bind(token)
            .fetch_one(app.pool())
            .await
            .expect("invitation row must exist");
    assert_eq!(status, "expired");
}
