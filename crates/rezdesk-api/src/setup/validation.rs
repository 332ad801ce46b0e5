//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use rezdesk_core::Config;

/// Validate critical configuration values
///
/// Runs the config's own structural checks, then the deployment-level checks
/// that only matter for a running server. Fails fast so a misconfigured
/// instance never starts serving.
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let is_production = config.is_production();

    // Validate CORS configuration in production
    if is_production && config.cors_origins.contains(&"*".to_string()) {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production - this is a security risk. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    if is_production && config.automation_base_url.is_none() {
        tracing::warn!(
            "Automation platform not configured - CRM ticket sync and funding checks disabled"
        );
    }

    // Validate database connection settings
    if config.db_max_connections == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }

    if config.db_timeout_seconds == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    tracing::info!("Configuration validation passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server_port: 8080,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            database_url: "postgres://localhost/rezdesk".to_string(),
            db_max_connections: 20,
            db_timeout_seconds: 30,
            jwks_url: "https://id.example/.well-known/jwks.json".to_string(),
            jwks_cache_ttl_seconds: 3600,
            introspection_url: "https://id.example/oauth/introspect".to_string(),
            invite_base_url: "https://app.rezdesk.example".to_string(),
            automation_base_url: None,
            automation_webhook_secret: None,
            rate_limit_general_per_minute: 100,
            rate_limit_auth_per_minute: 10,
            rate_limit_sensitive_per_minute: 30,
        }
    }

    #[test]
    fn wildcard_cors_is_fine_outside_production() {
        assert!(validate_config(&config()).is_ok());
    }

    #[test]
    fn wildcard_cors_is_rejected_in_production() {
        let mut config = config();
        config.environment = "production".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn zero_connection_settings_are_rejected() {
        let mut config = config();
        config.db_max_connections = 0;
        assert!(validate_config(&config).is_err());
    }
}
