//! Onboarding queue over HTTP: submission, duplicate handling, and the
//! one-live-draft-per-email rule.

mod helpers;

use axum::http::StatusCode;
use helpers::{api_path, fixtures, setup_test_app};
use rezdesk_core::PlatformRole;
use serde_json::{json, Value};
use uuid::Uuid;

fn registration_body(provider_id: Uuid, email: &str) -> Value {
    json!({
        "email": email,
        "firstNames": "Thandi",
        "surname": "Nkosi",
        "phoneNumber": "+27821234567",
        "idNumber": "8001015009087",
        "streetAddress": "12 Jorissen St",
        "city": "Johannesburg",
        "postalCode": "2001",
        "requestedRole": "Residence Manager",
        "providerId": provider_id,
    })
}

#[tokio::test]
async fn submission_queues_a_pending_draft() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;

    let response = app
        .client()
        .post(&api_path("/onboarding"))
        .json(&registration_body(provider_id, "new.staff@res.example"))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let pending_id: Uuid = serde_json::from_value(body["pendingUserId"].clone())
        .expect("response must carry the draft id");

    let (status, role_code): (String, i32) =
        sqlx::query_as("SELECT status::text, role_code FROM pending_staff WHERE id = $1")
            .bind(pending_id)
            .fetch_one(app.pool())
            .await
            .expect("draft row must exist");
    assert_eq!(status, "pending");
    assert_eq!(role_code, 2);
}

#[tokio::test]
async fn duplicate_submission_conflicts_until_completed() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    let body = registration_body(provider_id, "new.staff@res.example");

    let first = app.client().post(&api_path("/onboarding")).json(&body).await;
    first.assert_status_ok();

    let second = app.client().post(&api_path("/onboarding")).json(&body).await;
    second.assert_status(StatusCode::CONFLICT);

    // Once the provisioner finalizes the draft, a fresh registration may queue.
    sqlx::query("UPDATE pending_staff SET status = 'completed' WHERE email = $1")
        .bind("new.staff@res.example")
        .execute(app.pool())
        .await
        .expect("Failed to finalize draft");

    let third = app.client().post(&api_path("/onboarding")).json(&body).await;
    third.assert_status_ok();
}

#[tokio::test]
async fn invalid_id_number_is_rejected() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;

    let mut body = registration_body(provider_id, "new.staff@res.example");
    body["idNumber"] = json!("8001015009088");

    let response = app.client().post(&api_path("/onboarding")).json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn email_with_an_existing_account_conflicts() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    fixtures::create_user(
        app.pool(),
        "existing@res.example",
        PlatformRole::ProviderStaff,
        Some(provider_id),
    )
    .await;

    let response = app
        .client()
        .post(&api_path("/onboarding"))
        .json(&registration_body(provider_id, "existing@res.example"))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_provider_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/onboarding"))
        .json(&registration_body(Uuid::new_v4(), "new.staff@res.example"))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}
