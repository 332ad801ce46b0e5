//! Support tickets with best-effort CRM sync.
//!
//! Tickets persist as `open` first; the CRM push runs once afterwards. A sync
//! failure is logged and the ticket stays `open` for a later manual push, so
//! ticket capture never depends on the automation platform being up.

use crate::automation::CrmSync;
use rezdesk_core::models::Ticket;
use rezdesk_core::AppError;
use rezdesk_db::TicketRepository;
use std::sync::Arc;
use uuid::Uuid;

/// Normalize and validate ticket input. Empty category defaults to `general`.
pub fn validate_ticket_input(
    subject: &str,
    body: &str,
    category: &str,
) -> Result<(String, String, String), AppError> {
    let subject = subject.trim();
    let body = body.trim();
    if subject.is_empty() {
        return Err(AppError::InvalidInput("Subject is required".to_string()));
    }
    if body.is_empty() {
        return Err(AppError::InvalidInput("Body is required".to_string()));
    }
    let category = match category.trim() {
        "" => "general",
        other => other,
    };
    Ok((subject.to_string(), body.to_string(), category.to_string()))
}

#[derive(Clone)]
pub struct TicketService {
    tickets: TicketRepository,
    crm: Option<Arc<dyn CrmSync>>,
}

impl TicketService {
    pub fn new(tickets: TicketRepository, crm: Option<Arc<dyn CrmSync>>) -> Self {
        Self { tickets, crm }
    }

    pub async fn create(
        &self,
        provider_id: Option<Uuid>,
        raised_by: Uuid,
        subject: &str,
        body: &str,
        category: &str,
    ) -> Result<Ticket, AppError> {
        let (subject, body, category) = validate_ticket_input(subject, body, category)?;

        let ticket = self
            .tickets
            .insert(provider_id, raised_by, &subject, &body, &category)
            .await?;

        let Some(crm) = &self.crm else {
            return Ok(ticket);
        };

        match crm.sync_ticket(&ticket).await {
            Ok(crm_ref) => {
                let synced = self.tickets.mark_synced(ticket.id, &crm_ref).await?;
                Ok(synced.unwrap_or(ticket))
            }
            Err(err) => {
                // Capture succeeded; the push can be repeated later.
                tracing::warn!(ticket_id = %ticket.id, "CRM sync failed: {}", err);
                Ok(ticket)
            }
        }
    }

    pub async fn list(&self, provider_id: Uuid) -> Result<Vec<Ticket>, AppError> {
        self.tickets.list_by_provider(provider_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_and_body_are_required() {
        assert!(matches!(
            validate_ticket_input("  ", "body", "x"),
            Err(AppError::InvalidInput(msg)) if msg.contains("Subject")
        ));
        assert!(matches!(
            validate_ticket_input("subject", "", "x"),
            Err(AppError::InvalidInput(msg)) if msg.contains("Body")
        ));
    }

    #[test]
    fn empty_category_defaults_to_general() {
        let (subject, body, category) =
            validate_ticket_input(" Wifi down ", "No connectivity in block B", " ").unwrap();
        assert_eq!(subject, "Wifi down");
        assert_eq!(body, "No connectivity in block B");
        assert_eq!(category, "general");
    }

    #[test]
    fn explicit_category_is_kept() {
        let (_, _, category) = validate_ticket_input("s", "b", "maintenance").unwrap();
        assert_eq!(category, "maintenance");
    }
}
