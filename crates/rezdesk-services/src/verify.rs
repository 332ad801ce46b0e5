//! Bearer-credential verification for privileged claims endpoints.
//!
//! Two credential families are accepted: machine service credentials carrying
//! the `rzk_live_` prefix (checked against the external introspection
//! endpoint) and user identity tokens (RS256/ES256 JWTs checked against the
//! identity provider's JWKS). The prefix picks which path runs first; a
//! verification failure on that path falls through to the other. Verified
//! credentials with insufficient authority are forbidden, not unauthorized,
//! and never fall through.

use crate::jwks::JwksVerifier;
use async_trait::async_trait;
use rezdesk_core::config::{MACHINE_TOKEN_PREFIX, REQUIRED_MACHINE_SCOPE};
use rezdesk_core::{AppError, PlatformRole};
use serde::Deserialize;
use std::sync::Arc;

/// Which credential family authenticated the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    Machine,
    User,
}

/// Verified caller of a privileged endpoint.
#[derive(Debug, Clone)]
pub struct AdminActor {
    pub actor_id: String,
    pub method: AuthMethod,
}

/// Introspection response for a machine credential (RFC 7662 shape).
#[derive(Debug, Clone, Deserialize)]
pub struct Introspection {
    pub active: bool,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
}

impl Introspection {
    pub fn has_scope(&self, required: &str) -> bool {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().any(|sc| sc == required))
            .unwrap_or(false)
    }
}

/// Machine-credential introspection, behind a trait so authorization
/// decisions are testable without the network.
#[async_trait]
pub trait MachineIntrospector: Send + Sync {
    async fn introspect(&self, token: &str) -> Result<Introspection, AppError>;
}

/// User-token verification seam over [`JwksVerifier`].
#[async_trait]
pub trait UserTokenVerifier: Send + Sync {
    /// Returns `(subject, role_code)` for a cryptographically valid token.
    async fn verify(&self, token: &str) -> Result<(String, i32), AppError>;
}

/// Single-attempt introspection against the identity platform.
pub struct HttpIntrospector {
    client: reqwest::Client,
    url: String,
}

impl HttpIntrospector {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl MachineIntrospector for HttpIntrospector {
    async fn introspect(&self, token: &str) -> Result<Introspection, AppError> {
        let response = self
            .client
            .post(&self.url)
            .form(&[("token", token)])
            .send()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Introspection request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "Introspection endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<Introspection>()
            .await
            .map_err(|e| AppError::Unauthorized(format!("Invalid introspection response: {}", e)))
    }
}

#[async_trait]
impl UserTokenVerifier for JwksVerifier {
    async fn verify(&self, token: &str) -> Result<(String, i32), AppError> {
        let claims = self.validate_token(token).await?;
        Ok((claims.sub, claims.role_code.unwrap_or(0)))
    }
}

/// Sentinel actor id for machine credentials whose introspection response
/// carries no `client_id`.
const MACHINE_ACTOR_FALLBACK: &str = "machine-client";

/// Verifies bearer credentials for the claims endpoints.
pub struct TokenVerifier {
    machine: Arc<dyn MachineIntrospector>,
    user: Arc<dyn UserTokenVerifier>,
}

impl TokenVerifier {
    pub fn new(machine: Arc<dyn MachineIntrospector>, user: Arc<dyn UserTokenVerifier>) -> Self {
        Self { machine, user }
    }

    /// Authorize a bearer credential, returning the verified actor.
    ///
    /// Failures other than `Forbidden` on the first path fall through to the
    /// other; both failing yields 401. No retries on either path.
    pub async fn authorize(&self, bearer: &str) -> Result<AdminActor, AppError> {
        if bearer.starts_with(MACHINE_TOKEN_PREFIX) {
            match self.authorize_machine(bearer).await {
                Ok(actor) => Ok(actor),
                Err(err @ AppError::Forbidden(_)) => Err(err),
                Err(first) => {
                    tracing::debug!("machine credential rejected, trying user path: {}", first);
                    self.authorize_user(bearer).await.map_err(unauthorized_unless_forbidden)
                }
            }
        } else {
            match self.authorize_user(bearer).await {
                Ok(actor) => Ok(actor),
                Err(err @ AppError::Forbidden(_)) => Err(err),
                Err(first) => {
                    tracing::debug!("user token rejected, trying machine path: {}", first);
                    self.authorize_machine(bearer)
                        .await
                        .map_err(unauthorized_unless_forbidden)
                }
            }
        }
    }

    async fn authorize_machine(&self, token: &str) -> Result<AdminActor, AppError> {
        let introspection = self.machine.introspect(token).await?;
        if !introspection.active {
            return Err(AppError::Unauthorized("Token is not active".to_string()));
        }
        if !introspection.has_scope(REQUIRED_MACHINE_SCOPE) {
            return Err(AppError::Forbidden(format!(
                "Token is missing required scope '{}'",
                REQUIRED_MACHINE_SCOPE
            )));
        }
        Ok(AdminActor {
            actor_id: introspection
                .client_id
                .unwrap_or_else(|| MACHINE_ACTOR_FALLBACK.to_string()),
            method: AuthMethod::Machine,
        })
    }

    async fn authorize_user(&self, token: &str) -> Result<AdminActor, AppError> {
        let (subject, role_code) = self.user.verify(token).await?;
        if role_code < PlatformRole::Admin.code() {
            return Err(AppError::Forbidden(
                "Administrator role required".to_string(),
            ));
        }
        Ok(AdminActor {
            actor_id: subject,
            method: AuthMethod::User,
        })
    }
}

/// Both verification paths exhausted: present as 401 unless the second path
/// positively verified the credential and found it lacking.
fn unauthorized_unless_forbidden(err: AppError) -> AppError {
    match err {
        forbidden @ AppError::Forbidden(_) => forbidden,
        _ => AppError::Unauthorized("Invalid or expired credentials".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubIntrospector(Result<Introspection, ()>);

    #[async_trait]
    impl MachineIntrospector for StubIntrospector {
        async fn introspect(&self, _token: &str) -> Result<Introspection, AppError> {
            self.0
                .clone()
                .map_err(|_| AppError::Unauthorized("introspection failed".to_string()))
        }
    }

    struct StubUserVerifier(Result<(String, i32), ()>);

    #[async_trait]
    impl UserTokenVerifier for StubUserVerifier {
        async fn verify(&self, _token: &str) -> Result<(String, i32), AppError> {
            self.0
                .clone()
                .map_err(|_| AppError::Unauthorized("bad signature".to_string()))
        }
    }

    fn verifier(
        machine: Result<Introspection, ()>,
        user: Result<(String, i32), ()>,
    ) -> TokenVerifier {
        TokenVerifier::new(
            Arc::new(StubIntrospector(machine)),
            Arc::new(StubUserVerifier(user)),
        )
    }

    fn active(scope: &str, client_id: Option<&str>) -> Introspection {
        Introspection {
            active: true,
            scope: Some(scope.to_string()),
            client_id: client_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn machine_token_with_scope_is_authorized() {
        let v = verifier(Ok(active("platform:claims profile", Some("svc-1"))), Err(()));
        let actor = v.authorize("rzk_live_abc").await.unwrap();
        assert_eq!(actor.actor_id, "svc-1");
        assert_eq!(actor.method, AuthMethod::Machine);
    }

    #[tokio::test]
    async fn machine_token_missing_client_id_uses_sentinel() {
        let v = verifier(Ok(active("platform:claims", None)), Err(()));
        let actor = v.authorize("rzk_live_abc").await.unwrap();
        assert_eq!(actor.actor_id, "machine-client");
    }

    #[tokio::test]
    async fn machine_token_missing_scope_is_forbidden_not_unauthorized() {
        let v = verifier(Ok(active("profile email", Some("svc-1"))), Err(()));
        let err = v.authorize("rzk_live_abc").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn inactive_machine_token_falls_through_to_user_path() {
        let v = verifier(
            Ok(Introspection {
                active: false,
                scope: None,
                client_id: None,
            }),
            Ok(("admin-1".to_string(), 4)),
        );
        let actor = v.authorize("rzk_live_abc").await.unwrap();
        assert_eq!(actor.method, AuthMethod::User);
        assert_eq!(actor.actor_id, "admin-1");
    }

    #[tokio::test]
    async fn user_jwt_with_admin_role_is_authorized() {
        let v = verifier(Err(()), Ok(("admin-1".to_string(), 3)));
        let actor = v.authorize("eyJhbGciOi...").await.unwrap();
        assert_eq!(actor.method, AuthMethod::User);
    }

    #[tokio::test]
    async fn verified_user_below_admin_is_forbidden() {
        let v = verifier(Err(()), Ok(("owner-1".to_string(), 2)));
        let err = v.authorize("eyJhbGciOi...").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn both_paths_failing_is_unauthorized() {
        let v = verifier(Err(()), Err(()));
        let err = v.authorize("garbage").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
