//! # sims-common
//!
//! Shared utilities including configuration, error handling, authentication, and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    hash_password, validate_password_strength, verify_password, Claims, JwtService,
    PasswordService, TokenPair, TokenType,
};
pub use config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, Environment, FeedConfig,
    GatewayConfig, JwtConfig, OAuthConfig, OAuthProviderConfig, OnboardingConfig, PushConfig,
    RateLimitConfig, RedisConfig, ServerConfig, StorageConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{
    init_tracing, try_init_tracing, try_init_tracing_with_config, LogFormat, TracingConfig,
    TracingError,
};
