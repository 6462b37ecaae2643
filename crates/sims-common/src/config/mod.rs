//! Configuration structs

mod app_config;

pub use app_config::{
    AppConfig, AppSettings, ConfigError, CorsConfig, DatabaseConfig, Environment, FeedConfig,
    GatewayConfig, JwtConfig, OAuthConfig, OAuthProviderConfig, OnboardingConfig, PushConfig,
    RateLimitConfig, RedisConfig, ServerConfig, StorageConfig,
};
