//! deadpool-redis pool plus the JSON key/value helpers the session store needs.

use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sims_common::RedisConfig;
use sims_core::error::DomainError;

#[derive(Debug, thiserror::Error)]
pub enum RedisPoolError {
    #[error("Failed to create Redis pool: {0}")]
    CreatePool(String),

    #[error("Failed to get connection from pool: {0}")]
    GetConnection(#[from] deadpool_redis::PoolError),

    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<RedisPoolError> for DomainError {
    fn from(e: RedisPoolError) -> Self {
        DomainError::CacheError(e.to_string())
    }
}

pub type RedisResult<T> = Result<T, RedisPoolError>;

/// Pooled Redis connections. Pub/sub needs a dedicated connection, so the URL is kept.
#[derive(Clone)]
pub struct RedisPool {
    pool: Pool,
    url: String,
}

impl std::fmt::Debug for RedisPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisPool")
            .field("url", &redact(&self.url))
            .field("status", &self.pool.status())
            .finish()
    }
}

/// Drop the `user:password@` part of a Redis URL
fn redact(url: &str) -> &str {
    url.rsplit_once('@').map_or(url, |(_, host)| host)
}

impl RedisPool {
    pub fn from_config(config: &RedisConfig) -> RedisResult<Self> {
        let pool = Config::from_url(&config.url)
            .builder()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?
            .max_size(config.max_connections as usize)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| RedisPoolError::CreatePool(e.to_string()))?;

        tracing::info!(
            url = %redact(&config.url),
            max_connections = config.max_connections,
            "Redis pool created"
        );

        Ok(Self {
            pool,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn get(&self) -> RedisResult<deadpool_redis::Connection> {
        self.pool.get().await.map_err(RedisPoolError::GetConnection)
    }

    /// Store `value` as JSON under `key`, expiring after `ttl_seconds`
    pub async fn put_json<V: Serialize>(
        &self,
        key: &str,
        value: &V,
        ttl_seconds: u64,
    ) -> RedisResult<()> {
        let json = serde_json::to_string(value)?;
        let mut conn = self.get().await?;
        conn.set_ex::<_, _, ()>(key, json, ttl_seconds).await?;
        Ok(())
    }

    pub async fn get_json<V: DeserializeOwned>(&self, key: &str) -> RedisResult<Option<V>> {
        let mut conn = self.get().await?;
        let raw: Option<String> = conn.get(key).await?;
        raw.map(|v| serde_json::from_str(&v))
            .transpose()
            .map_err(Into::into)
    }

    /// `true` when the key existed
    pub async fn delete(&self, key: &str) -> RedisResult<bool> {
        let mut conn = self.get().await?;
        let deleted: i32 = conn.del(key).await?;
        Ok(deleted > 0)
    }
}
