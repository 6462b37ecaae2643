//! PostgreSQL implementation of PushSubscriptionRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use sims_core::entities::PushSubscription;
use sims_core::traits::{PushSubscriptionRepository, RepoResult};

use crate::models::PushSubscriptionModel;

use super::error::map_db_error;

/// PostgreSQL implementation of PushSubscriptionRepository
#[derive(Clone)]
pub struct PgPushSubscriptionRepository {
    pool: PgPool,
}

impl PgPushSubscriptionRepository {
    /// Create a new PgPushSubscriptionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PushSubscriptionRepository for PgPushSubscriptionRepository {
    #[instrument(skip(self, subscription), fields(user_id = %subscription.user_id))]
    async fn upsert(&self, subscription: &PushSubscription) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO push_subscriptions (id, user_id, endpoint, p256dh, auth, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (endpoint) DO UPDATE
            SET user_id = EXCLUDED.user_id,
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.user_id)
        .bind(&subscription.endpoint)
        .bind(&subscription.p256dh)
        .bind(&subscription.auth)
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: Uuid) -> RepoResult<Vec<PushSubscription>> {
        let results = sqlx::query_as::<_, PushSubscriptionModel>(
            r#"
            SELECT id, user_id, endpoint, p256dh, auth, created_at
            FROM push_subscriptions
            WHERE user_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(PushSubscription::from).collect())
    }

    #[instrument(skip(self))]
    async fn delete_by_endpoint(&self, endpoint: &str) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE endpoint = $1")
            .bind(endpoint)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PgPushSubscriptionRepository>();
    }
}
