//! Refresh token storage in Redis.
//!
//! Each refresh token maps to its session and expires with it, so signing out
//! is a single delete.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sims_core::traits::{RefreshTokenRecord, RefreshTokenRepository, RepoResult};

use crate::pool::RedisPool;

const REFRESH_TOKEN_PREFIX: &str = "refresh_token:";

/// Value stored under a refresh token key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenData {
    pub user_id: Uuid,
    pub session_id: String,
    /// Unix epoch seconds
    pub created_at: i64,
}

impl RefreshTokenData {
    #[must_use]
    pub fn new(user_id: Uuid, session_id: String) -> Self {
        Self {
            user_id,
            session_id,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

impl From<RefreshTokenData> for RefreshTokenRecord {
    fn from(data: RefreshTokenData) -> Self {
        Self {
            user_id: data.user_id,
            session_id: data.session_id,
        }
    }
}

#[derive(Clone)]
pub struct RefreshTokenStore {
    pool: RedisPool,
}

impl RefreshTokenStore {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn key(token: &str) -> String {
        format!("{REFRESH_TOKEN_PREFIX}{token}")
    }
}

#[async_trait]
impl RefreshTokenRepository for RefreshTokenStore {
    async fn store(
        &self,
        token: &str,
        record: &RefreshTokenRecord,
        ttl_secs: u64,
    ) -> RepoResult<()> {
        let data = RefreshTokenData::new(record.user_id, record.session_id.clone());
        self.pool.put_json(&Self::key(token), &data, ttl_secs).await?;

        tracing::debug!(
            user_id = %data.user_id,
            session_id = %data.session_id,
            ttl_secs,
            "Stored refresh token"
        );
        Ok(())
    }

    async fn validate(&self, token: &str) -> RepoResult<Option<RefreshTokenRecord>> {
        let data = self
            .pool
            .get_json::<RefreshTokenData>(&Self::key(token))
            .await?;
        Ok(data.map(RefreshTokenRecord::from))
    }

    async fn revoke(&self, token: &str) -> RepoResult<()> {
        if self.pool.delete(&Self::key(token)).await? {
            tracing::debug!("Revoked refresh token");
        }
        Ok(())
    }
}
