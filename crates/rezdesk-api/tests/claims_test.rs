//! Claims writer against a real database: the accept handoff's second phase,
//! idempotency, and the name/code correspondence on the stored record.

mod helpers;

use helpers::{api_path, fixtures, setup_test_app};
use rezdesk_core::{AppError, PlatformRole};
use rezdesk_services::ClaimsUpdate;
use serde_json::{json, Value};
use uuid::Uuid;

#[tokio::test]
async fn set_claims_stores_the_ladder_role_name() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    let uid = fixtures::create_user(
        app.pool(),
        "owner@res.example",
        PlatformRole::None,
        None,
    )
    .await;

    let claims = app
        .state
        .services
        .claims
        .set_claims(ClaimsUpdate {
            uid,
            platform_role: "provider".to_string(),
            role_code: 2,
            provider_id: Some(provider_id),
        })
        .await
        .expect("claims write must succeed");
    assert_eq!(claims.role, "provider");
    assert_eq!(claims.role_code, 2);

    let (stored_role, role_code, sync_pending): (String, i32, bool) = sqlx::query_as(
        "SELECT platform_role, role_code, claims_sync_pending FROM users WHERE id = $1",
    )
    .bind(uid)
    .fetch_one(app.pool())
    .await
    .expect("user row must exist");

    // The record keeps the fine-grained name matching the code.
    assert_eq!(stored_role, "provider_owner");
    assert_eq!(role_code, 2);
    assert!(!sync_pending);
    assert_eq!(
        PlatformRole::from_name(&stored_role),
        PlatformRole::from_code(role_code)
    );
}

#[tokio::test]
async fn set_claims_is_idempotent() {
    let app = setup_test_app().await;
    let provider_id = fixtures::create_provider(app.pool(), "Sunnyside Residence").await;
    let uid = fixtures::create_user(
        app.pool(),
        "staff@res.example",
        PlatformRole::None,
        None,
    )
    .await;
    let update = ClaimsUpdate {
        uid,
        platform_role: "provider".to_string(),
        role_code: 1,
        provider_id: Some(provider_id),
    };

    let first = app
        .state
        .services
        .claims
        .set_claims(update.clone())
        .await
        .expect("first claims write must succeed");
    let second = app
        .state
        .services
        .claims
        .set_claims(update)
        .await
        .expect("repeated claims write must succeed");
    assert_eq!(first, second);

    let (stored_role, role_code): (String, i32) =
        sqlx::query_as("SELECT platform_role, role_code FROM users WHERE id = $1")
            .bind(uid)
            .fetch_one(app.pool())
            .await
            .expect("user row must exist");
    assert_eq!(stored_role, "provider_staff");
    assert_eq!(role_code, 1);
}

#[tokio::test]
async fn accept_handoff_completes_with_a_consistent_record() {
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

    let user_id = Uuid::new_v4();
    let response = app
        .client()
        .post(&api_path("/invitations/accept"))
        .json(&json!({
            "token": token,
            "userId": user_id,
            "email": "staff@res.example",
            "firstNames": "Thandi",
            "surname": "Nkosi",
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();

    // Second phase: apply the returned claims data through the writer.
    app.state
        .services
        .claims
        .set_claims(ClaimsUpdate {
            uid: user_id,
            platform_role: body["claimsData"]["role"].as_str().unwrap().to_string(),
            role_code: body["claimsData"]["roleCode"].as_i64().unwrap() as i32,
            provider_id: Some(provider_id),
        })
        .await
        .expect("handoff claims write must succeed");

    let (stored_role, role_code, sync_pending): (String, i32, bool) = sqlx::query_as(
        "SELECT platform_role, role_code, claims_sync_pending FROM users WHERE id = $1",
    )
    .bind(user_id)
    .fetch_one(app.pool())
    .await
    .expect("user row must exist");
    assert_eq!(stored_role, "provider_staff");
    assert_eq!(role_code, 1);
    assert!(!sync_pending);
}

#[tokio::test]
async fn claims_sync_retrigger_requires_a_known_subject() {
    let app = setup_test_app().await;

    let err = app
        .state
        .services
        .claims
        .trigger_claims_sync(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let uid = fixtures::create_user(
        app.pool(),
        "staff@res.example",
        PlatformRole::ProviderStaff,
        None,
    )
    .await;
    app.state
        .services
        .claims
        .trigger_claims_sync(uid)
        .await
        .expect("retrigger for a known subject must succeed");

    let (sync_pending,): (bool,) =
        sqlx::query_as("SELECT claims_sync_pending FROM users WHERE id = $1")
            .bind(uid)
            .fetch_one(app.pool())
            .await
            .expect("user row must exist");
    assert!(sync_pending);
}
