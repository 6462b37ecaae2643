//! PostgreSQL implementation of FriendshipRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use sims_core::entities::Friendship;
use sims_core::error::DomainError;
use sims_core::traits::{FriendshipRepository, RepoResult};

use crate::models::FriendshipModel;

use super::error::{map_db_error, map_unique_violation};

/// PostgreSQL implementation of FriendshipRepository
#[derive(Clone)]
pub struct PgFriendshipRepository {
    pool: PgPool,
}

impl PgFriendshipRepository {
    /// Create a new PgFriendshipRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FriendshipRepository for PgFriendshipRepository {
    #[instrument(skip(self))]
    async fn find_between(&self, a: Uuid, b: Uuid) -> RepoResult<Option<Friendship>> {
        let result = sqlx::query_as::<_, FriendshipModel>(
            r#"
            SELECT id, requester_id, addressee_id, status, created_at
            FROM friendships
            WHERE (requester_id = $1 AND addressee_id = $2)
               OR (requester_id = $2 AND addressee_id = $1)
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Friendship::try_from).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Friendship>> {
        let result = sqlx::query_as::<_, FriendshipModel>(
            r#"
            SELECT id, requester_id, addressee_id, status, created_at
            FROM friendships
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        result.map(Friendship::try_from).transpose()
    }

    #[instrument(skip(self, friendship), fields(friendship_id = %friendship.id))]
    async fn create(&self, friendship: &Friendship) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO friendships (id, requester_id, addressee_id, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(friendship.id)
        .bind(friendship.requester_id)
        .bind(friendship.addressee_id)
        .bind(friendship.status.as_str())
        .bind(friendship.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || DomainError::FriendshipExists))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn accept(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("UPDATE friendships SET status = 'accepted' WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::FriendshipNotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM friendships WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::FriendshipNotFound);
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_accepted(&self, user_id: Uuid) -> RepoResult<Vec<Friendship>> {
        let results = sqlx::query_as::<_, FriendshipModel>(
            r#"
            SELECT id, requester_id, addressee_id, status, created_at
            FROM friendships
            WHERE status = 'accepted' AND (requester_id = $1 OR addressee_id = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(Friendship::try_from).collect()
    }

    #[instrument(skip(self))]
    async fn list_incoming(&self, user_id: Uuid) -> RepoResult<Vec<Friendship>> {
        let results = sqlx::query_as::<_, FriendshipModel>(
            r#"
            SELECT id, requester_id, addressee_id, status, created_at
            FROM friendships
            WHERE status = 'pending' AND addressee_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        results.into_iter().map(Friendship::try_from).collect()
    }
}
