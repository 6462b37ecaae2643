//! Feed post, comment, and their joined read models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Maximum post or comment length in characters
pub const MAX_POST_CHARS: usize = 280;

/// Maximum images attached to a post
pub const MAX_POST_IMAGES: usize = 4;

/// Feed post entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPost {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: Option<String>,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl FeedPost {
    /// Build a validated post. Blank text is stored as `None`.
    pub fn new(
        author_id: Uuid,
        content: Option<String>,
        image_urls: Vec<String>,
    ) -> Result<Self, DomainError> {
        let content = content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        if let Some(text) = &content {
            if text.chars().count() > MAX_POST_CHARS {
                return Err(DomainError::ContentTooLong {
                    max: MAX_POST_CHARS,
                });
            }
        }
        if image_urls.len() > MAX_POST_IMAGES {
            return Err(DomainError::TooManyImages {
                max: MAX_POST_IMAGES,
            });
        }
        if content.is_none() && image_urls.is_empty() {
            return Err(DomainError::EmptyPost);
        }

        Ok(Self {
            id: Uuid::new_v4(),
            author_id,
            content,
            image_urls,
            created_at: Utc::now(),
        })
    }

    /// Text worth scanning for mentions
    pub fn mention_text(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

/// Public author fields joined onto posts and comments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Post joined with its author and aggregate counts, as seen by one viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPostView {
    pub post: FeedPost,
    pub author: AuthorSummary,
    pub like_count: i64,
    pub comment_count: i64,
    pub liked_by_me: bool,
}

impl FeedPostView {
    #[inline]
    pub fn id(&self) -> Uuid {
        self.post.id
    }
}

/// Comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl PostComment {
    pub fn new(post_id: Uuid, author_id: Uuid, content: &str) -> Result<Self, DomainError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::ValidationError(
                "comment cannot be empty".to_string(),
            ));
        }
        if content.chars().count() > MAX_POST_CHARS {
            return Err(DomainError::ContentTooLong {
                max: MAX_POST_CHARS,
            });
        }
        Ok(Self {
            id: Uuid::new_v4(),
            post_id,
            author_id,
            content: content.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// Comment joined with its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub comment: PostComment,
    pub author: AuthorSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_requires_text_or_image() {
        let author = Uuid::new_v4();
        assert!(matches!(
            FeedPost::new(author, Some("   ".into()), vec![]),
            Err(DomainError::EmptyPost)
        ));
        assert!(FeedPost::new(author, None, vec!["https://img/1.png".into()]).is_ok());

        let post = FeedPost::new(author, Some("  sul sul  ".into()), vec![]).unwrap();
        assert_eq!(post.content.as_deref(), Some("sul sul"));
    }

    #[test]
    fn test_post_length_limit() {
        let author = Uuid::new_v4();
        assert!(FeedPost::new(author, Some("a".repeat(MAX_POST_CHARS)), vec![]).is_ok());
        assert!(matches!(
            FeedPost::new(author, Some("a".repeat(MAX_POST_CHARS + 1)), vec![]),
            Err(DomainError::ContentTooLong { .. })
        ));
    }

    #[test]
    fn test_post_image_limit() {
        let images = (0..5).map(|i| format!("https://img/{i}.png")).collect();
        assert!(matches!(
            FeedPost::new(Uuid::new_v4(), None, images),
            Err(DomainError::TooManyImages { max: 4 })
        ));
    }

    #[test]
    fn test_comment_validation() {
        let c = PostComment::new(Uuid::new_v4(), Uuid::new_v4(), " nice ").unwrap();
        assert_eq!(c.content, "nice");
        assert!(PostComment::new(Uuid::new_v4(), Uuid::new_v4(), "").is_err());
    }
}
