//! Route configuration and setup

use crate::handlers;
use crate::middleware::rate_limit::{rate_limit_middleware, HttpRateLimiter, RateLimitTiers};
use crate::state::{AppState, AuthState};
use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use rezdesk_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const API_PREFIX: &str = "/api/v0";

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let rate_limiter = setup_rate_limiter(config);
    let auth_state = state.auth.clone();

    // Public routes: health, the OpenAPI document, and the invitee/applicant
    // endpoints reached before any credentials exist.
    let public_routes = public_routes(state.clone());

    // User routes require an identity-provider JWT.
    let user_routes = user_routes(state.clone()).layer(axum::middleware::from_fn_with_state(
        auth_state.clone(),
        crate::auth::middleware::user_auth_middleware,
    ));

    // Claims routes sit behind the dual-credential admin gate.
    let admin_routes = admin_routes(state.clone()).layer(axum::middleware::from_fn_with_state(
        auth_state,
        crate::auth::middleware::admin_auth_middleware,
    ));

    let app = public_routes
        .merge(user_routes)
        .merge(admin_routes)
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ))
        .with_state(state);

    Ok(app)
}

/// Server-level concurrency limit to protect against resource exhaustion
/// under extreme load.
fn http_concurrency_limit() -> usize {
    std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Setup rate limiter with periodic cleanup task
fn setup_rate_limiter(config: &Config) -> Arc<HttpRateLimiter> {
    let shard_count = std::env::var("RATE_LIMITER_SHARD_COUNT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(16)
        .max(1);

    let rate_limiter = Arc::new(HttpRateLimiter::with_shards(
        RateLimitTiers {
            auth_per_minute: config.rate_limit_auth_per_minute,
            sensitive_per_minute: config.rate_limit_sensitive_per_minute,
            general_per_minute: config.rate_limit_general_per_minute,
        },
        shard_count,
    ));

    // Periodic cleanup to prevent memory growth from expired buckets
    let rate_limiter_for_cleanup = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter_for_cleanup.cleanup_expired_buckets().await;
        }
    });

    tracing::info!(
        general_per_minute = config.rate_limit_general_per_minute,
        auth_per_minute = config.rate_limit_auth_per_minute,
        sensitive_per_minute = config.rate_limit_sensitive_per_minute,
        shard_count = shard_count,
        "HTTP rate limiting enabled with sharded buckets and automatic cleanup"
    );
    rate_limiter
}

/// Public routes (no authentication required)
fn public_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/health",
            get({
                let state = state.clone();
                move || async move { health_check(state).await }
            }),
        )
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
        .route(
            &format!("{}/invitations/accept", API_PREFIX),
            post(handlers::invitations::accept_invitation),
        )
        .route(
            &format!("{}/invitations/{{token}}", API_PREFIX),
            get(handlers::invitations::get_invitation),
        )
        .route(
            &format!("{}/onboarding", API_PREFIX),
            post(handlers::onboarding::register_staff),
        )
}

/// Routes requiring an identity-provider JWT.
fn user_routes(_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/invitations", API_PREFIX),
            post(handlers::invitations::create_invitation)
                .get(handlers::invitations::list_invitations),
        )
        .route(
            &format!("{}/invitations/{{token}}/revoke", API_PREFIX),
            post(handlers::invitations::revoke_invitation),
        )
        .route(
            &format!("{}/onboarding", API_PREFIX),
            get(handlers::onboarding::list_onboarding),
        )
        .route(
            &format!("{}/permissions/check", API_PREFIX),
            get(handlers::permissions::check_permissions),
        )
        .route(
            &format!("{}/tickets", API_PREFIX),
            post(handlers::tickets::create_ticket).get(handlers::tickets::list_tickets),
        )
        .route(
            &format!("{}/funding/verify", API_PREFIX),
            post(handlers::funding::verify_funding),
        )
}

/// Routes behind the dual-credential admin gate.
fn admin_routes(_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/claims", API_PREFIX),
            post(handlers::claims::set_claims),
        )
        .route(
            &format!("{}/claims/sync", API_PREFIX),
            post(handlers::claims::trigger_claims_sync),
        )
}

#[derive(serde::Serialize)]
struct HealthCheckResponse {
    status: String,
    database: String,
}

async fn health_check(state: Arc<AppState>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let mut response = HealthCheckResponse {
        status: "healthy".to_string(),
        database: "unknown".to_string(),
    };

    let mut overall_healthy = true;

    match tokio::time::timeout(TIMEOUT, sqlx::query("SELECT 1").execute(&state.db.pool)).await {
        Ok(Ok(_)) => {
            response.database = "healthy".to_string();
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Database health check failed");
            response.database = format!("unhealthy: {}", e);
            overall_healthy = false;
        }
        Err(_) => {
            tracing::error!("Database health check timed out");
            response.database = "timeout".to_string();
            overall_healthy = false;
        }
    }

    let status_code = if overall_healthy {
        StatusCode::OK
    } else {
        response.status = "unhealthy".to_string();
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
