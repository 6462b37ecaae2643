//! Post service
//!
//! Posts, comments and likes. Every write that concerns another user sends
//! a notification in the background; the write itself never waits on it.

use sims_core::entities::{FeedPost, FeedPostView, PostComment};
use sims_core::{ChangeKind, DomainError, NewNotification, NotificationType, Table};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dto::{
    CommentResponse, CreateCommentRequest, CreatePostRequest, FeedQuery, PageResponse,
    PostResponse,
};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

const MAX_PAGE_SIZE: i64 = 50;

/// Post service
pub struct PostService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PostService<'a> {
    /// Create a new PostService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Publish a post and fan out mentions
    #[instrument(skip(self, request), fields(author_id = %author_id))]
    pub async fn create_post(
        &self,
        author_id: Uuid,
        request: CreatePostRequest,
    ) -> ServiceResult<PostResponse> {
        let post = FeedPost::new(author_id, request.content, request.image_urls)?;
        self.ctx.post_repo().create(&post).await?;
        info!(post_id = %post.id, "Post created");

        self.ctx
            .publish_change(Table::FeedPosts, ChangeKind::Insert, &post)
            .await;

        if let Some(text) = post.mention_text() {
            self.ctx
                .notifier()
                .dispatch_mentions(
                    text.to_string(),
                    author_id,
                    NotificationType::Mention,
                    post.id,
                );
        }

        let view = self.view(post.id, author_id).await?;
        Ok(PostResponse::from(&view))
    }

    /// A single post as seen by `viewer_id`
    #[instrument(skip(self))]
    pub async fn get_post(&self, viewer_id: Uuid, post_id: Uuid) -> ServiceResult<PostResponse> {
        let view = self.view(post_id, viewer_id).await?;
        Ok(PostResponse::from(&view))
    }

    /// Newest first, by offset
    #[instrument(skip(self, query))]
    pub async fn list_feed(
        &self,
        viewer_id: Uuid,
        query: FeedQuery,
    ) -> ServiceResult<PageResponse<PostResponse>> {
        let limit = query
            .limit
            .unwrap_or(self.ctx.settings().feed_page_size)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = query.offset.unwrap_or(0).max(0);

        let views = self
            .ctx
            .post_repo()
            .list_feed(viewer_id, limit, offset)
            .await?;

        Ok(PageResponse::new(
            views.iter().map(PostResponse::from).collect(),
            offset,
            limit,
        ))
    }

    /// Authors delete their own posts; admins delete any
    #[instrument(skip(self))]
    pub async fn delete_post(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<()> {
        let post = self.load(post_id).await?;

        if post.author_id != user_id {
            let is_admin = self
                .ctx
                .profile_repo()
                .find_by_id(user_id)
                .await?
                .is_some_and(|p| p.is_admin);
            if !is_admin {
                return Err(DomainError::NotPostAuthor.into());
            }
        }

        self.ctx.post_repo().delete(post_id).await?;
        info!(post_id = %post_id, "Post deleted");
        self.ctx
            .publish_change(Table::FeedPosts, ChangeKind::Delete, &post)
            .await;
        Ok(())
    }

    /// Comment on a post, notifying the post author and anyone mentioned
    #[instrument(skip(self, request))]
    pub async fn add_comment(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        request: CreateCommentRequest,
    ) -> ServiceResult<CommentResponse> {
        let post = self.load(post_id).await?;
        let comment = PostComment::new(post_id, user_id, &request.content)?;
        self.ctx.post_repo().add_comment(&comment).await?;
        info!(comment_id = %comment.id, "Comment added");

        self.ctx
            .publish_change(Table::PostComments, ChangeKind::Insert, &comment)
            .await;

        if post.author_id != user_id {
            self.ctx.notifier().notify(
                NewNotification::new(post.author_id, NotificationType::Comment)
                    .actor(user_id)
                    .preview(&comment.content)
                    .reference(post.id),
            );
        }
        self.ctx
            .notifier()
            .dispatch_mentions(
                comment.content.clone(),
                user_id,
                NotificationType::Mention,
                comment.id,
            );

        let author = self
            .ctx
            .profile_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::ProfileNotFound(user_id))?;

        Ok(CommentResponse {
            id: comment.id,
            post_id: comment.post_id,
            author: (&author).into(),
            segments: sims_core::render_rich_text(&comment.content),
            content: comment.content,
            created_at: comment.created_at,
        })
    }

    /// Oldest first
    #[instrument(skip(self))]
    pub async fn list_comments(&self, post_id: Uuid) -> ServiceResult<Vec<CommentResponse>> {
        self.load(post_id).await?;
        let comments = self.ctx.post_repo().list_comments(post_id).await?;
        Ok(comments.iter().map(CommentResponse::from).collect())
    }

    /// Like a post. Liking twice is a no-op and notifies once.
    #[instrument(skip(self))]
    pub async fn like_post(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<PostResponse> {
        let post = self.load(post_id).await?;
        let created = self.ctx.post_repo().like(post_id, user_id).await?;

        if created && post.author_id != user_id {
            self.ctx.notifier().notify(
                NewNotification::new(post.author_id, NotificationType::Like)
                    .actor(user_id)
                    .reference(post.id),
            );
        }

        let view = self.view(post_id, user_id).await?;
        Ok(PostResponse::from(&view))
    }

    #[instrument(skip(self))]
    pub async fn unlike_post(&self, user_id: Uuid, post_id: Uuid) -> ServiceResult<PostResponse> {
        self.load(post_id).await?;
        self.ctx.post_repo().unlike(post_id, user_id).await?;
        let view = self.view(post_id, user_id).await?;
        Ok(PostResponse::from(&view))
    }

    async fn load(&self, post_id: Uuid) -> ServiceResult<FeedPost> {
        self.ctx
            .post_repo()
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::PostNotFound(post_id).into())
    }

    async fn view(&self, post_id: Uuid, viewer_id: Uuid) -> ServiceResult<FeedPostView> {
        self.ctx
            .post_repo()
            .find_view(post_id, viewer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Post", post_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    fn text_post(content: &str) -> CreatePostRequest {
        CreatePostRequest {
            content: Some(content.to_string()),
            image_urls: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_post_fans_out_mentions() {
        let h = TestHarness::new();
        let author = h.profile("bella").await;
        let mortimer = h.profile("mortimer").await;

        let post = PostService::new(&h.ctx)
            .create_post(author.id, text_post("hi @mortimer and @bella"))
            .await
            .unwrap();
        assert_eq!(post.author.id, author.id);
        assert_eq!(post.like_count, 0);

        h.wait_for_notifications(mortimer.id, 1).await;
        let inbox = h.notifications.for_user(mortimer.id);
        assert_eq!(inbox[0].notification_type, NotificationType::Mention);
        assert_eq!(inbox[0].reference_id, Some(post.id));
        assert!(h.notifications.for_user(author.id).is_empty());
    }

    #[tokio::test]
    async fn test_create_post_rejects_empty() {
        let h = TestHarness::new();
        let author = h.profile("bella").await;

        let err = PostService::new(&h.ctx)
            .create_post(
                author.id,
                CreatePostRequest {
                    content: Some("   ".to_string()),
                    image_urls: vec![],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_POST");
    }

    #[tokio::test]
    async fn test_like_notifies_author_once() {
        let h = TestHarness::new();
        let author = h.profile("bella").await;
        let fan = h.profile("mortimer").await;
        let service = PostService::new(&h.ctx);
        let post = service.create_post(author.id, text_post("hello")).await.unwrap();

        let liked = service.like_post(fan.id, post.id).await.unwrap();
        assert_eq!(liked.like_count, 1);
        assert!(liked.liked_by_me);

        let again = service.like_post(fan.id, post.id).await.unwrap();
        assert_eq!(again.like_count, 1);

        h.wait_for_notifications(author.id, 1).await;
        tokio::task::yield_now().await;
        assert_eq!(h.notifications.for_user(author.id).len(), 1);

        let unliked = service.unlike_post(fan.id, post.id).await.unwrap();
        assert_eq!(unliked.like_count, 0);
    }

    #[tokio::test]
    async fn test_comment_notifies_author_not_self() {
        let h = TestHarness::new();
        let author = h.profile("bella").await;
        let commenter = h.profile("mortimer").await;
        let service = PostService::new(&h.ctx);
        let post = service.create_post(author.id, text_post("hello")).await.unwrap();

        service
            .add_comment(
                author.id,
                post.id,
                CreateCommentRequest {
                    content: "my own".to_string(),
                },
            )
            .await
            .unwrap();
        let comment = service
            .add_comment(
                commenter.id,
                post.id,
                CreateCommentRequest {
                    content: "nice one".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(comment.author.username, "mortimer");

        h.wait_for_notifications(author.id, 1).await;
        let inbox = h.notifications.for_user(author.id);
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].notification_type, NotificationType::Comment);
        assert_eq!(inbox[0].content.as_deref(), Some("nice one"));

        let comments = service.list_comments(post.id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "my own");
    }

    #[tokio::test]
    async fn test_only_author_or_admin_deletes() {
        let h = TestHarness::new();
        let author = h.profile("bella").await;
        let other = h.profile("mortimer").await;
        let admin = h.admin("judith").await;
        let service = PostService::new(&h.ctx);

        let post = service.create_post(author.id, text_post("one")).await.unwrap();
        let err = service.delete_post(other.id, post.id).await.unwrap_err();
        assert_eq!(err.status_code(), 403);

        service.delete_post(admin.id, post.id).await.unwrap();
        let err = service.get_post(author.id, post.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_list_feed_pages() {
        let h = TestHarness::new();
        let author = h.profile("bella").await;
        let service = PostService::new(&h.ctx);
        for i in 0..3 {
            service
                .create_post(author.id, text_post(&format!("post {i}")))
                .await
                .unwrap();
        }

        let page = service
            .list_feed(
                author.id,
                FeedQuery {
                    limit: Some(2),
                    offset: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.items[0].content.as_deref(), Some("post 2"));
    }
}
