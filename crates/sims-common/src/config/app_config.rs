//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub oauth: OAuthConfig,
    pub onboarding: OnboardingConfig,
    pub storage: StorageConfig,
    pub feed: FeedConfig,
    pub push: PushConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(format!("unknown environment {other}")),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Public base URL the browser reaches this server at
    pub public_url: String,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// WebSocket gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
}

impl GatewayConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry: i64,
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry: i64,
}

/// Credentials and endpoints for one OAuth provider
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: String,
}

/// OAuth configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub google: Option<OAuthProviderConfig>,
    pub discord: Option<OAuthProviderConfig>,
    /// Seconds the callback waits for a session before giving up
    #[serde(default = "default_callback_timeout_secs")]
    pub callback_timeout_secs: u64,
    /// Where the browser lands after a callback, e.g. the web app origin
    pub app_redirect_base: String,
}

/// Invite-gate settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardingConfig {
    /// Emails that become admins on their first sign-in
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

impl OnboardingConfig {
    #[must_use]
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
    }
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    pub public_base_url: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: u32,
}

impl StorageConfig {
    #[must_use]
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb as usize * 1024 * 1024
    }
}

/// Feed settings
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

/// Push worker settings
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    #[serde(default = "default_push_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_push_concurrency")]
    pub concurrency: usize,
    pub vapid_subject: String,
    /// Raw P-256 private key, URL-safe base64 without padding
    pub vapid_private_key: String,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst: u32,
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_app_name() -> String {
    "sims-community".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_heartbeat_interval_ms() -> u64 {
    41_250
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_access_token_expiry() -> i64 {
    900 // 15 minutes
}

fn default_refresh_token_expiry() -> i64 {
    604_800 // 7 days
}

fn default_callback_timeout_secs() -> u64 {
    10
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_max_file_size() -> u32 {
    5
}

fn default_page_size() -> i64 {
    20
}

fn default_push_timeout_secs() -> u64 {
    10
}

fn default_push_concurrency() -> usize {
    8
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst() -> u32 {
    50
}

/// Read a variable, falling back to `default` when unset and failing when unparsable
fn parse_or<T: FromStr>(key: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key, raw)),
        Err(_) => Ok(default()),
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVar(key))
}

fn string_or(key: &'static str, default: impl FnOnce() -> String) -> String {
    env::var(key).unwrap_or_else(|_| default())
}

fn list(key: &'static str) -> Vec<String> {
    env::var(key)
        .ok()
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// A provider is enabled only when its client id is set
fn oauth_provider(
    prefix: &'static str,
    client_id_key: &'static str,
    client_secret_key: &'static str,
    defaults: [&str; 4],
) -> Result<Option<OAuthProviderConfig>, ConfigError> {
    let Ok(client_id) = env::var(client_id_key) else {
        return Ok(None);
    };
    let with_prefix = |suffix: &str| env::var(format!("{prefix}_{suffix}")).ok();
    let [authorize_url, token_url, userinfo_url, scopes] = defaults;

    Ok(Some(OAuthProviderConfig {
        client_id,
        client_secret: required(client_secret_key)?,
        authorize_url: with_prefix("AUTHORIZE_URL").unwrap_or_else(|| authorize_url.to_string()),
        token_url: with_prefix("TOKEN_URL").unwrap_or_else(|| token_url.to_string()),
        userinfo_url: with_prefix("USERINFO_URL").unwrap_or_else(|| userinfo_url.to_string()),
        scopes: with_prefix("SCOPES").unwrap_or_else(|| scopes.to_string()),
    }))
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_port = parse_or("API_PORT", || 8080)?;
        let api_public_url =
            string_or("API_PUBLIC_URL", || format!("http://localhost:{api_port}"));

        Ok(Self {
            app: AppSettings {
                name: string_or("APP_NAME", default_app_name),
                env: parse_or("APP_ENV", Environment::default)?,
            },
            api: ServerConfig {
                host: string_or("API_HOST", default_host),
                port: api_port,
                public_url: api_public_url.clone(),
            },
            gateway: GatewayConfig {
                host: string_or("GATEWAY_HOST", default_host),
                port: parse_or("GATEWAY_PORT", || 8081)?,
                heartbeat_interval_ms: parse_or(
                    "GATEWAY_HEARTBEAT_INTERVAL_MS",
                    default_heartbeat_interval_ms,
                )?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: parse_or("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
                run_migrations: parse_or("DATABASE_RUN_MIGRATIONS", default_true)?,
            },
            redis: RedisConfig {
                url: required("REDIS_URL")?,
                max_connections: parse_or("REDIS_MAX_CONNECTIONS", default_redis_max_connections)?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                access_token_expiry: parse_or(
                    "JWT_ACCESS_TOKEN_EXPIRY",
                    default_access_token_expiry,
                )?,
                refresh_token_expiry: parse_or(
                    "JWT_REFRESH_TOKEN_EXPIRY",
                    default_refresh_token_expiry,
                )?,
            },
            oauth: OAuthConfig {
                google: oauth_provider(
                    "GOOGLE",
                    "GOOGLE_CLIENT_ID",
                    "GOOGLE_CLIENT_SECRET",
                    [
                        "https://accounts.google.com/o/oauth2/v2/auth",
                        "https://oauth2.googleapis.com/token",
                        "https://openidconnect.googleapis.com/v1/userinfo",
                        "openid email profile",
                    ],
                )?,
                discord: oauth_provider(
                    "DISCORD",
                    "DISCORD_CLIENT_ID",
                    "DISCORD_CLIENT_SECRET",
                    [
                        "https://discord.com/oauth2/authorize",
                        "https://discord.com/api/oauth2/token",
                        "https://discord.com/api/users/@me",
                        "identify email",
                    ],
                )?,
                callback_timeout_secs: parse_or(
                    "OAUTH_CALLBACK_TIMEOUT_SECS",
                    default_callback_timeout_secs,
                )?,
                app_redirect_base: string_or("APP_REDIRECT_BASE", || api_public_url.clone()),
            },
            onboarding: OnboardingConfig {
                admin_emails: list("ADMIN_EMAILS"),
            },
            storage: StorageConfig {
                upload_dir: string_or("UPLOAD_DIR", default_upload_dir),
                public_base_url: string_or("STORAGE_PUBLIC_URL", || {
                    format!("{api_public_url}/uploads")
                }),
                max_file_size_mb: parse_or("MAX_FILE_SIZE_MB", default_max_file_size)?,
            },
            feed: FeedConfig {
                page_size: parse_or("FEED_PAGE_SIZE", default_page_size)?,
            },
            push: PushConfig {
                request_timeout_secs: parse_or("PUSH_TIMEOUT_SECS", default_push_timeout_secs)?,
                concurrency: parse_or("PUSH_CONCURRENCY", default_push_concurrency)?,
                vapid_subject: string_or("VAPID_SUBJECT", || {
                    "mailto:admin@localhost".to_string()
                }),
                vapid_private_key: string_or("VAPID_PRIVATE_KEY", String::new),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: parse_or(
                    "RATE_LIMIT_REQUESTS_PER_SECOND",
                    default_requests_per_second,
                )?,
                burst: parse_or("RATE_LIMIT_BURST", default_burst)?,
            },
            cors: CorsConfig {
                allowed_origins: list("CORS_ALLOWED_ORIGINS"),
            },
        })
    }

    /// Configuration for tests and local runs without external services
    #[must_use]
    pub fn for_testing() -> Self {
        let public_url = "http://localhost:8080".to_string();
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: Environment::Development,
            },
            api: ServerConfig {
                host: default_host(),
                port: 0,
                public_url: public_url.clone(),
            },
            gateway: GatewayConfig {
                host: default_host(),
                port: 0,
                heartbeat_interval_ms: default_heartbeat_interval_ms(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/sims_test".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
                run_migrations: false,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                max_connections: default_redis_max_connections(),
            },
            jwt: JwtConfig {
                secret: "test-secret-key-that-is-long-enough".to_string(),
                access_token_expiry: default_access_token_expiry(),
                refresh_token_expiry: default_refresh_token_expiry(),
            },
            oauth: OAuthConfig {
                google: None,
                discord: None,
                callback_timeout_secs: default_callback_timeout_secs(),
                app_redirect_base: public_url.clone(),
            },
            onboarding: OnboardingConfig::default(),
            storage: StorageConfig {
                upload_dir: default_upload_dir(),
                public_base_url: format!("{public_url}/uploads"),
                max_file_size_mb: default_max_file_size(),
            },
            feed: FeedConfig {
                page_size: default_page_size(),
            },
            push: PushConfig {
                request_timeout_secs: default_push_timeout_secs(),
                concurrency: default_push_concurrency(),
                vapid_subject: "mailto:admin@localhost".to_string(),
                vapid_private_key: String::new(),
            },
            rate_limit: RateLimitConfig {
                requests_per_second: 1000,
                burst: 1000,
            },
            cors: CorsConfig {
                allowed_origins: Vec::new(),
            },
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
