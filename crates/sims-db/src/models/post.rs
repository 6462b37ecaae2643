//! Feed post and comment database models

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for feed_posts table
#[derive(Debug, Clone, FromRow)]
pub struct FeedPostModel {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: Option<String>,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Post joined with author summary and interaction counters
#[derive(Debug, Clone, FromRow)]
pub struct FeedPostViewModel {
    #[sqlx(flatten)]
    pub post: FeedPostModel,
    pub author_username: String,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
}

/// Comment joined with author summary
#[derive(Debug, Clone, FromRow)]
pub struct CommentViewModel {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_username: String,
    pub author_display_name: String,
    pub author_avatar_url: Option<String>,
}
