//! Onboarding queue: staff-registration drafts awaiting external provisioning.
//!
//! Submission validates the registration, refuses emails that already have an
//! account or a live draft, and writes a `pending` row. Everything after that
//! belongs to the external provisioner.

use rezdesk_core::models::PendingStaff;
use rezdesk_core::validation::{validate_email, validate_sa_id_number};
use rezdesk_core::{roles, AppError};
use rezdesk_db::{PendingStaffRepository, ProviderRepository, UserRepository};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StaffRegistration {
    pub email: String,
    pub first_names: String,
    pub surname: String,
    pub phone_number: Option<String>,
    pub id_number: String,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub requested_role: String,
    pub provider_id: Uuid,
}

/// Field validation for a registration. First failure wins; each maps to 400.
pub fn validate_registration(registration: &StaffRegistration) -> Result<(), AppError> {
    if registration.first_names.trim().is_empty() {
        return Err(AppError::InvalidInput("First names are required".to_string()));
    }
    if registration.surname.trim().is_empty() {
        return Err(AppError::InvalidInput("Surname is required".to_string()));
    }
    if !validate_email(&registration.email) {
        return Err(AppError::InvalidInput(
            "A valid email address is required".to_string(),
        ));
    }
    validate_sa_id_number(&registration.id_number)
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;
    Ok(())
}

#[derive(Clone)]
pub struct OnboardingService {
    pending: PendingStaffRepository,
    users: UserRepository,
    providers: ProviderRepository,
}

impl OnboardingService {
    pub fn new(
        pending: PendingStaffRepository,
        users: UserRepository,
        providers: ProviderRepository,
    ) -> Self {
        Self {
            pending,
            users,
            providers,
        }
    }

    pub async fn submit(&self, registration: StaffRegistration) -> Result<PendingStaff, AppError> {
        validate_registration(&registration)?;

        if self
            .providers
            .get_by_id(registration.provider_id)
            .await?
            .is_none()
        {
            return Err(AppError::BadRequest("Unknown provider".to_string()));
        }

        if self.users.get_by_email(&registration.email).await?.is_some() {
            return Err(AppError::Conflict(
                "An account already exists for this email".to_string(),
            ));
        }

        let role_code = roles::role_code_for_label(&registration.requested_role);

        let draft = self
            .pending
            .insert_pending(
                &registration.email,
                registration.first_names.trim(),
                registration.surname.trim(),
                registration.phone_number.as_deref(),
                Some(&registration.id_number),
                registration.street_address.as_deref(),
                registration.city.as_deref(),
                registration.postal_code.as_deref(),
                &registration.requested_role,
                role_code,
                registration.provider_id,
            )
            .await?
            .ok_or_else(|| {
                AppError::Conflict("A registration is already pending for this email".to_string())
            })?;

        tracing::info!(
            pending_id = %draft.id,
            provider_id = %draft.provider_id,
            role_code = draft.role_code,
            "staff registration queued"
        );

        Ok(draft)
    }

    pub async fn list(&self, provider_id: Uuid) -> Result<Vec<PendingStaff>, AppError> {
        self.pending.list_by_provider(provider_id).await
    }
}
