//! PostgreSQL implementation of PostRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use sims_core::entities::{CommentView, FeedPost, FeedPostView, PostComment};
use sims_core::error::DomainError;
use sims_core::traits::{PostRepository, RepoResult};

use crate::models::{CommentViewModel, FeedPostModel, FeedPostViewModel};

use super::error::map_db_error;

/// Shared projection for feed rows. `$1` is the viewer id.
const FEED_VIEW_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.content, p.image_urls, p.created_at,
           a.username AS author_username,
           a.display_name AS author_display_name,
           a.avatar_url AS author_avatar_url,
           (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS like_count,
           (SELECT COUNT(*) FROM post_comments c WHERE c.post_id = p.id) AS comment_count,
           EXISTS (SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = $1)
               AS liked_by_me
    FROM feed_posts p
    JOIN profiles a ON a.id = p.author_id
"#;

/// PostgreSQL implementation of PostRepository
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    /// Create a new PgPostRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    #[instrument(skip(self, post), fields(post_id = %post.id))]
    async fn create(&self, post: &FeedPost) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO feed_posts (id, author_id, content, image_urls, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.content)
        .bind(&post.image_urls)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<FeedPost>> {
        let result = sqlx::query_as::<_, FeedPostModel>(
            r#"
            SELECT id, author_id, content, image_urls, created_at
            FROM feed_posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(FeedPost::from))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM feed_posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::PostNotFound(id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_view(&self, id: Uuid, viewer_id: Uuid) -> RepoResult<Option<FeedPostView>> {
        let result = sqlx::query_as::<_, FeedPostViewModel>(&format!(
            "{FEED_VIEW_SELECT} WHERE p.id = $2"
        ))
        .bind(viewer_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(FeedPostView::from))
    }

    #[instrument(skip(self))]
    async fn list_feed(
        &self,
        viewer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<FeedPostView>> {
        let results = sqlx::query_as::<_, FeedPostViewModel>(&format!(
            "{FEED_VIEW_SELECT} ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(viewer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(FeedPostView::from).collect())
    }

    #[instrument(skip(self, comment), fields(post_id = %comment.post_id))]
    async fn add_comment(&self, comment: &PostComment) -> RepoResult<()> {
        sqlx::query(
            r#"
            INSERT INTO post_comments (id, post_id, author_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_comments(&self, post_id: Uuid) -> RepoResult<Vec<CommentView>> {
        let results = sqlx::query_as::<_, CommentViewModel>(
            r#"
            SELECT c.id, c.post_id, c.author_id, c.content, c.created_at,
                   a.username AS author_username,
                   a.display_name AS author_display_name,
                   a.avatar_url AS author_avatar_url
            FROM post_comments c
            JOIN profiles a ON a.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(CommentView::from).collect())
    }

    #[instrument(skip(self))]
    async fn like(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn unlike(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND user_id = $2")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}
