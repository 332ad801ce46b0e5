//! Configuration module
//!
//! Environment-driven configuration for the API and services. Loaded once at
//! startup via [`Config::from_env`], validated with [`Config::validate`]
//! before anything else is initialized (fail fast on misconfiguration), and
//! passed down by reference from the process entry point — no module-level
//! globals.

use std::env;

const DEFAULT_SERVER_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 20;
const DEFAULT_CONNECTION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_JWKS_CACHE_TTL_SECS: i64 = 3600;
const DEFAULT_RATE_LIMIT_GENERAL: u32 = 100;
const DEFAULT_RATE_LIMIT_AUTH: u32 = 10;
const DEFAULT_RATE_LIMIT_SENSITIVE: u32 = 30;

/// Scope a machine credential must carry to call privileged claims endpoints.
pub const REQUIRED_MACHINE_SCOPE: &str = "platform:claims";

/// Recognizable prefix on machine service credentials.
pub const MACHINE_TOKEN_PREFIX: &str = "rzk_live_";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,

    // Database
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,

    // Identity provider (user tokens)
    pub jwks_url: String,
    pub jwks_cache_ttl_seconds: i64,

    // Machine credentials (service-to-service)
    pub introspection_url: String,

    // Invitations
    pub invite_base_url: String,

    // Automation platform (CRM ticket sync, NSFAS funding verification)
    pub automation_base_url: Option<String>,
    pub automation_webhook_secret: Option<String>,

    // Rate limiting tiers (requests per minute, keyed by client IP)
    pub rate_limit_general_per_minute: u32,
    pub rate_limit_auth_per_minute: u32,
    pub rate_limit_sensitive_per_minute: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Load .env if present; real env always wins.
        dotenvy::dotenv().ok();

        Ok(Self {
            server_port: env_parse("SERVER_PORT", DEFAULT_SERVER_PORT),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cors_origins: env_list("CORS_ORIGINS"),
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL is required"))?,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", DEFAULT_CONNECTION_TIMEOUT_SECS),
            jwks_url: env::var("JWKS_URL").map_err(|_| anyhow::anyhow!("JWKS_URL is required"))?,
            jwks_cache_ttl_seconds: env_parse("JWKS_CACHE_TTL_SECONDS", DEFAULT_JWKS_CACHE_TTL_SECS),
            introspection_url: env::var("TOKEN_INTROSPECTION_URL")
                .map_err(|_| anyhow::anyhow!("TOKEN_INTROSPECTION_URL is required"))?,
            invite_base_url: env::var("INVITE_BASE_URL")
                .unwrap_or_else(|_| "https://app.rezdesk.example".to_string()),
            automation_base_url: env::var("AUTOMATION_BASE_URL").ok(),
            automation_webhook_secret: env::var("AUTOMATION_WEBHOOK_SECRET").ok(),
            rate_limit_general_per_minute: env_parse(
                "RATE_LIMIT_GENERAL_PER_MINUTE",
                DEFAULT_RATE_LIMIT_GENERAL,
            ),
            rate_limit_auth_per_minute: env_parse(
                "RATE_LIMIT_AUTH_PER_MINUTE",
                DEFAULT_RATE_LIMIT_AUTH,
            ),
            rate_limit_sensitive_per_minute: env_parse(
                "RATE_LIMIT_SENSITIVE_PER_MINUTE",
                DEFAULT_RATE_LIMIT_SENSITIVE,
            ),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL must not be empty");
        }
        if !self.jwks_url.starts_with("http") {
            anyhow::bail!("JWKS_URL must be an http(s) URL");
        }
        if !self.introspection_url.starts_with("http") {
            anyhow::bail!("TOKEN_INTROSPECTION_URL must be an http(s) URL");
        }
        if self.invite_base_url.trim_end_matches('/').is_empty() {
            anyhow::bail!("INVITE_BASE_URL must not be empty");
        }
        // The automation platform is optional, but a secret without a URL (or
        // the reverse) is a deployment mistake worth failing on.
        if self.automation_base_url.is_some() != self.automation_webhook_secret.is_some() {
            anyhow::bail!(
                "AUTOMATION_BASE_URL and AUTOMATION_WEBHOOK_SECRET must be set together"
            );
        }
        if self.rate_limit_general_per_minute == 0
            || self.rate_limit_auth_per_minute == 0
            || self.rate_limit_sensitive_per_minute == 0
        {
            anyhow::bail!("rate limits must be greater than zero");
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
