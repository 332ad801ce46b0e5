//! Automation-platform client.
//!
//! The low-code automation platform fronts the external CRM (ticket sync) and
//! the NSFAS funding-verification flow. Requests are JSON POSTs signed with
//! HMAC-SHA256 over the raw body, hex-encoded in `X-Webhook-Signature`.
//! Single attempt; a failure surfaces to the caller and is never retried here.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rezdesk_core::models::Ticket;
use rezdesk_core::AppError;
use serde::Deserialize;
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// CRM ticket sync, behind a trait so the ticket service is testable without
/// the platform.
#[async_trait]
pub trait CrmSync: Send + Sync {
    /// Push a ticket to the CRM; returns the CRM reference.
    async fn sync_ticket(&self, ticket: &Ticket) -> Result<String, AppError>;
}

/// NSFAS funding verification.
#[async_trait]
pub trait FundingCheck: Send + Sync {
    async fn verify_funding(
        &self,
        id_number: &str,
        email: &str,
    ) -> Result<FundingVerification, AppError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct FundingVerification {
    pub funded: bool,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TicketSyncResponse {
    crm_ref: String,
}

/// Sign a request body for the automation platform.
pub fn sign_payload(secret: &[u8], body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

pub struct AutomationClient {
    http: reqwest::Client,
    base_url: String,
    secret: Vec<u8>,
}

impl AutomationClient {
    pub fn new(http: reqwest::Client, base_url: String, secret: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.into_bytes(),
        }
    }

    async fn post(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, AppError> {
        let body = serde_json::to_vec(payload)?;
        let signature = sign_payload(&self.secret, &body);

        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("automation request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "automation platform returned {} for {}",
                status, path
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid automation response: {}", e)))
    }
}

#[async_trait]
impl CrmSync for AutomationClient {
    async fn sync_ticket(&self, ticket: &Ticket) -> Result<String, AppError> {
        let payload = serde_json::json!({
            "ticketId": ticket.id,
            "providerId": ticket.provider_id,
            "raisedBy": ticket.raised_by,
            "subject": ticket.subject,
            "body": ticket.body,
            "category": ticket.category,
            "createdAt": ticket.created_at.to_rfc3339(),
        });
        let response = self.post("/tickets/sync", &payload).await?;
        let parsed: TicketSyncResponse = serde_json::from_value(response)
            .map_err(|e| AppError::Upstream(format!("invalid ticket sync response: {}", e)))?;
        Ok(parsed.crm_ref)
    }
}

#[async_trait]
impl FundingCheck for AutomationClient {
    async fn verify_funding(
        &self,
        id_number: &str,
        email: &str,
    ) -> Result<FundingVerification, AppError> {
        let payload = serde_json::json!({
            "idNumber": id_number,
            "email": email,
        });
        let response = self.post("/funding/verify", &payload).await?;
        serde_json::from_value(response)
            .map_err(|e| AppError::Upstream(format!("invalid funding response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signatures_are_hex_sha256_over_the_exact_body() {
        let sig = sign_payload(b"secret", b"{\"a\":1}");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic for the same secret and body.
        assert_eq!(sig, sign_payload(b"secret", b"{\"a\":1}"));
        // Any change to secret or body changes the signature.
        assert_ne!(sig, sign_payload(b"secret2", b"{\"a\":1}"));
        assert_ne!(sig, sign_payload(b"secret", b"{\"a\":2}"));
    }
}
