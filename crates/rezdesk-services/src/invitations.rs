//! Invitation lifecycle: create, fetch, accept, revoke, list.
//!
//! An invitation is a single-use, time-boxed grant of one role within one
//! provider to one email address. Lifecycle state is evaluated with the pure
//! [`effective_status`] overlay at every boundary; acceptance and revocation
//! are conditional updates so the first writer wins under concurrency.

use chrono::{DateTime, Utc};
use rand::RngCore;
use rezdesk_core::models::{
    effective_status, EffectiveStatus, Invitation, UserAccount, UserClaims,
};
use rezdesk_core::validation::validate_email;
use rezdesk_core::{AppError, PlatformRole};
use rezdesk_db::{InvitationRepository, ProviderRepository, UserRepository};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Opaque invitation secret: 32 CSPRNG bytes, lowercase hex.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug, Clone)]
pub struct CreateInvitation {
    pub email: String,
    pub assigned_role: String,
    pub provider_id: Uuid,
    pub invited_by: Uuid,
    pub invited_by_name: Option<String>,
    pub invited_by_email: Option<String>,
    pub inviter_role_code: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedInvitation {
    #[serde(rename = "invitationId")]
    pub invitation_id: Uuid,
    #[serde(rename = "inviteUrl")]
    pub invite_url: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

/// Invitation details returned on fetch. The raw token is withheld: the caller
/// already holds it, and listings must never leak it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvitationDetails {
    pub email: String,
    #[serde(rename = "assignedRole")]
    pub assigned_role: String,
    #[serde(rename = "roleLabel")]
    pub role_label: String,
    #[serde(rename = "roleCode")]
    pub role_code: i32,
    #[serde(rename = "providerId")]
    pub provider_id: Uuid,
    #[serde(rename = "providerName", skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(rename = "invitedByName", skip_serializing_if = "Option::is_none")]
    pub invited_by_name: Option<String>,
    #[serde(rename = "invitedByEmail", skip_serializing_if = "Option::is_none")]
    pub invited_by_email: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AcceptInvitation {
    pub token: String,
    pub user_id: Uuid,
    pub email: String,
    pub first_names: String,
    pub surname: String,
    pub phone_number: Option<String>,
    pub id_number: Option<String>,
}

/// Outcome of the first phase of the accept handoff. `claims_data` is what
/// the caller must pass to the claims writer to complete the second phase;
/// until then the account's `claims_sync_pending` flag stays set.
#[derive(Debug, Clone)]
pub struct AcceptedInvitation {
    pub user: UserAccount,
    pub claims_data: UserClaims,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InvitationSummary {
    pub id: Uuid,
    pub email: String,
    #[serde(rename = "assignedRole")]
    pub assigned_role: String,
    #[serde(rename = "roleCode")]
    pub role_code: i32,
    pub status: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "acceptedAt", skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(rename = "revokedAt", skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Lifecycle gate shared by fetch, accept and revoke: anything but an
/// in-window pending invitation is gone, with a status-specific message.
pub fn ensure_pending(invitation: &Invitation, now: DateTime<Utc>) -> Result<(), AppError> {
    match effective_status(invitation, now) {
        EffectiveStatus::Pending => Ok(()),
        EffectiveStatus::Accepted => Err(AppError::Gone(
            "Invitation has already been accepted".to_string(),
        )),
        EffectiveStatus::Revoked => Err(AppError::Gone("Invitation has been revoked".to_string())),
        EffectiveStatus::Expired => Err(AppError::Gone("Invitation has expired".to_string())),
    }
}

/// Claims corresponding to an invitation's role grant: platform tiers map to
/// the coarse `admin`/`provider` claim roles.
pub fn claims_for_invitation(invitation: &Invitation) -> UserClaims {
    if invitation.role_code >= PlatformRole::Admin.code() {
        UserClaims {
            role: "admin".to_string(),
            role_code: invitation.role_code,
            provider_id: None,
        }
    } else {
        UserClaims {
            role: "provider".to_string(),
            role_code: invitation.role_code,
            provider_id: Some(invitation.provider_id),
        }
    }
}

#[derive(Clone)]
pub struct InvitationService {
    invitations: InvitationRepository,
    providers: ProviderRepository,
    users: UserRepository,
    invite_base_url: String,
}

impl InvitationService {
    pub fn new(
        invitations: InvitationRepository,
        providers: ProviderRepository,
        users: UserRepository,
        invite_base_url: String,
    ) -> Self {
        Self {
            invitations,
            providers,
            users,
            invite_base_url: invite_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn create(&self, request: CreateInvitation) -> Result<CreatedInvitation, AppError> {
        if !validate_email(&request.email) {
            return Err(AppError::InvalidInput(
                "A valid email address is required".to_string(),
            ));
        }

        let target = PlatformRole::from_name(&request.assigned_role).ok_or_else(|| {
            AppError::InvalidInput(format!("Unknown role '{}'", request.assigned_role))
        })?;
        let inviter = PlatformRole::from_code(request.inviter_role_code)
            .ok_or_else(|| AppError::Forbidden("Caller has no recognized role".to_string()))?;
        if !inviter.can_invite(target) {
            return Err(AppError::Forbidden(format!(
                "Role '{}' may not grant '{}'",
                inviter, target
            )));
        }

        let provider = self
            .providers
            .get_by_id(request.provider_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Provider not found".to_string()))?;

        let token = generate_token();
        let expires_at = Invitation::expiry_for(Utc::now());

        let invitation = self
            .invitations
            .create_pending(
                &token,
                &request.email,
                target.as_str(),
                target.code(),
                provider.id,
                Some(&provider.name),
                request.invited_by,
                request.invited_by_name.as_deref(),
                request.invited_by_email.as_deref(),
                expires_at,
            )
            .await?
            .ok_or_else(|| {
                AppError::Conflict(
                    "A pending invitation already exists for this email".to_string(),
                )
            })?;

        tracing::info!(
            invitation_id = %invitation.id,
            provider_id = %invitation.provider_id,
            role = %invitation.assigned_role,
            "invitation created"
        );

        Ok(CreatedInvitation {
            invitation_id: invitation.id,
            invite_url: format!("{}/invite/{}", self.invite_base_url, invitation.token),
            expires_at: invitation.expires_at,
        })
    }

    /// Resolve an invitation for display on the accept page.
    pub async fn fetch(&self, token: &str) -> Result<InvitationDetails, AppError> {
        let invitation = self.get_known(token).await?;
        ensure_pending(&invitation, Utc::now())?;

        let role_label = PlatformRole::from_name(&invitation.assigned_role)
            .map(|r| r.label().to_string())
            .unwrap_or_else(|| invitation.assigned_role.clone());

        Ok(InvitationDetails {
            email: invitation.email,
            assigned_role: invitation.assigned_role,
            role_label,
            role_code: invitation.role_code,
            provider_id: invitation.provider_id,
            provider_name: invitation.provider_name,
            invited_by_name: invitation.invited_by_name,
            invited_by_email: invitation.invited_by_email,
            created_at: invitation.created_at,
            expires_at: invitation.expires_at,
        })
    }

    /// First phase of the accept handoff: gate the lifecycle, match the email,
    /// win the conditional accept, then write the identity record with
    /// `claims_sync_pending` set. The caller completes the handoff through the
    /// claims writer with the returned `claims_data`.
    pub async fn accept(&self, request: AcceptInvitation) -> Result<AcceptedInvitation, AppError> {
        let invitation = self.get_known(&request.token).await?;
        self.gate_or_materialize_expiry(&invitation).await?;

        // Stored emails are lowercase; the match is case-insensitive.
        if invitation.email != request.email.trim().to_lowercase() {
            return Err(AppError::Forbidden(
                "This invitation was issued to a different email address".to_string(),
            ));
        }

        let invitation = self
            .invitations
            .mark_accepted(&request.token, request.user_id)
            .await?
            .ok_or_else(|| {
                // Lost the race against a concurrent accept or revoke.
                AppError::Gone("Invitation is no longer pending".to_string())
            })?;

        let user = self
            .users
            .upsert_from_invitation(
                request.user_id,
                &request.email,
                &request.first_names,
                &request.surname,
                request.phone_number.as_deref(),
                request.id_number.as_deref(),
                &invitation.assigned_role,
                invitation.role_code,
                invitation.provider_id,
            )
            .await?;

        tracing::info!(
            invitation_id = %invitation.id,
            user_id = %user.id,
            "invitation accepted, claims handoff pending"
        );

        let claims_data = claims_for_invitation(&invitation);
        Ok(AcceptedInvitation { user, claims_data })
    }

    pub async fn revoke(&self, token: &str) -> Result<Invitation, AppError> {
        let invitation = self.get_known(token).await?;
        self.gate_or_materialize_expiry(&invitation).await?;

        let revoked = self
            .invitations
            .mark_revoked(token)
            .await?
            .ok_or_else(|| AppError::Gone("Invitation is no longer pending".to_string()))?;

        tracing::info!(invitation_id = %revoked.id, "invitation revoked");
        Ok(revoked)
    }

    /// All invitations for a provider with read-time effective status.
    pub async fn list(&self, provider_id: Uuid) -> Result<Vec<InvitationSummary>, AppError> {
        let now = Utc::now();
        let rows = self.invitations.list_by_provider(provider_id).await?;
        Ok(rows
            .into_iter()
            .map(|inv| {
                let status = match effective_status(&inv, now) {
                    EffectiveStatus::Pending => "pending",
                    EffectiveStatus::Accepted => "accepted",
                    EffectiveStatus::Expired => "expired",
                    EffectiveStatus::Revoked => "revoked",
                };
                InvitationSummary {
                    id: inv.id,
                    email: inv.email,
                    assigned_role: inv.assigned_role,
                    role_code: inv.role_code,
                    status: status.to_string(),
                    created_at: inv.created_at,
                    expires_at: inv.expires_at,
                    accepted_at: inv.accepted_at,
                    revoked_at: inv.revoked_at,
                }
            })
            .collect())
    }

    async fn get_known(&self, token: &str) -> Result<Invitation, AppError> {
        self.invitations
            .get_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))
    }

    /// Lifecycle gate for write paths. A computed expiry is persisted here so
    /// later reads see the stored state directly.
    async fn gate_or_materialize_expiry(&self, invitation: &Invitation) -> Result<(), AppError> {
        let now = Utc::now();
        if let Err(gone) = ensure_pending(invitation, now) {
            if effective_status(invitation, now) == EffectiveStatus::Expired {
                self.invitations.mark_expired(&invitation.token).await?;
            }
            return Err(gone);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rezdesk_core::models::InvitationStatus;

    fn invitation(status: InvitationStatus, expires_at: DateTime<Utc>) -> Invitation {
        Invitation {
            id: Uuid::new_v4(),
            token: generate_token(),
            email: "staff@res.example".to_string(),
            assigned_role: "provider_staff".to_string(),
            role_code: 1,
            provider_id: Uuid::new_v4(),
            provider_name: Some("Sunnyside Residence".to_string()),
            invited_by: Uuid::new_v4(),
            invited_by_name: None,
            invited_by_email: None,
            status,
            created_at: expires_at - Duration::days(7),
            expires_at,
            accepted_at: None,
            accepted_by: None,
            revoked_at: None,
        }
    }

    #[test]
    fn tokens_are_64_lowercase_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        // Two draws must not collide.
        assert_ne!(token, generate_token());
    }

    #[test]
    fn pending_in_window_passes_the_gate() {
        let now = Utc::now();
        let inv = invitation(InvitationStatus::Pending, now + Duration::days(1));
        assert!(ensure_pending(&inv, now).is_ok());
    }

    #[test]
    fn lapsed_pending_is_gone_at_the_gate() {
        let now = Utc::now();
        let inv = invitation(InvitationStatus::Pending, now - Duration::seconds(1));
        let err = ensure_pending(&inv, now).unwrap_err();
        match err {
            AppError::Gone(msg) => assert_eq!(msg, "Invitation has expired"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn finalized_statuses_report_specific_messages() {
        let now = Utc::now();
        let accepted = invitation(InvitationStatus::Accepted, now + Duration::days(1));
        let revoked = invitation(InvitationStatus::Revoked, now + Duration::days(1));
        assert!(matches!(
            ensure_pending(&accepted, now),
            Err(AppError::Gone(msg)) if msg.contains("accepted")
        ));
        assert!(matches!(
            ensure_pending(&revoked, now),
            Err(AppError::Gone(msg)) if msg.contains("revoked")
        ));
    }

    #[test]
    fn provider_tier_invitations_map_to_provider_claims() {
        let now = Utc::now();
        let mut inv = invitation(InvitationStatus::Pending, now + Duration::days(1));
        inv.role_code = 2;
        let claims = claims_for_invitation(&inv);
        assert_eq!(claims.role, "provider");
        assert_eq!(claims.role_code, 2);
        assert_eq!(claims.provider_id, Some(inv.provider_id));
    }

    #[test]
    fn admin_tier_invitations_map_to_admin_claims_without_provider() {
        let now = Utc::now();
        let mut inv = invitation(InvitationStatus::Pending, now + Duration::days(1));
        inv.role_code = 3;
        inv.assigned_role = "admin".to_string();
        let claims = claims_for_invitation(&inv);
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.provider_id, None);
    }
}
