//! Support ticket handlers.

use crate::auth::models::UserContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::scoped_provider_id;
use crate::state::ServiceState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use rezdesk_core::models::Ticket;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "providerId")]
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateTicketResponse {
    pub success: bool,
    pub ticket: Ticket,
}

/// Raise a support ticket. The CRM push is best-effort; the ticket is
/// returned `open` when the push fails.
#[utoipa::path(
    post,
    path = "/api/v0/tickets",
    tag = "tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 200, description = "Ticket captured", body = CreateTicketResponse),
        (status = 400, description = "Missing subject or body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, ctx, request))]
pub async fn create_ticket(
    State(services): State<ServiceState>,
    ctx: UserContext,
    ValidatedJson(request): ValidatedJson<CreateTicketRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let raised_by = ctx.require_user_id()?;
    // Tickets may be raised without a provider (e.g. platform admins).
    let provider_id = request.provider_id.or(ctx.provider_id);

    let ticket = services
        .tickets
        .create(
            provider_id,
            raised_by,
            &request.subject,
            &request.body,
            &request.category,
        )
        .await?;

    Ok(Json(CreateTicketResponse {
        success: true,
        ticket,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    #[serde(rename = "providerId")]
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListTicketsResponse {
    pub success: bool,
    pub tickets: Vec<Ticket>,
}

/// List a provider's tickets, newest first.
#[utoipa::path(
    get,
    path = "/api/v0/tickets",
    tag = "tickets",
    params(
        ("providerId" = Option<Uuid>, Query, description = "Provider to list; defaults to the caller's provider")
    ),
    responses(
        (status = 200, description = "Tickets for the provider", body = ListTicketsResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 403, description = "Caller may not view this provider", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(services, ctx))]
pub async fn list_tickets(
    State(services): State<ServiceState>,
    ctx: UserContext,
    Query(query): Query<ListTicketsQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let provider_id = scoped_provider_id(&ctx, query.provider_id)?;
    let tickets = services.tickets.list(provider_id).await?;

    Ok(Json(ListTicketsResponse {
        success: true,
        tickets,
    }))
}
