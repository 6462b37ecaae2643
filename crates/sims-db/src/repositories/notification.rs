//! PostgreSQL implementation of NotificationRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use sims_core::entities::Notification;
use sims_core::traits::{NotificationRepository, RepoResult};

use crate::models::NotificationModel;

use super::error::map_db_error;

/// PostgreSQL implementation of NotificationRepository
#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    /// Create a new PgNotificationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    #[instrument(skip(self, notification), fields(user_id = %notification.user_id, kind = %notification.notification_type))]
    async fn create(&self, notification: &Notification) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, actor_id, type, content, reference_id,
                                       read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(notification.actor_id)
        .bind(notification.notification_type.as_str())
        .bind(&notification.content)
        .bind(notification.reference_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Notification>> {
        let results = sqlx::query_as::<_, NotificationModel>(
            r#"
            SELECT id, user_id, actor_id, type, content, reference_id, read, created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(Notification::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let result =
            sqlx::query("UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self, user_id: Uuid) -> RepoResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn unread_count(&self, user_id: Uuid) -> RepoResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(count)
    }
}
