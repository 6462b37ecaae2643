//! Post and comment model -> entity mappers

use sims_core::entities::{AuthorSummary, CommentView, FeedPost, FeedPostView, PostComment};

use crate::models::{CommentViewModel, FeedPostModel, FeedPostViewModel};

impl From<FeedPostModel> for FeedPost {
    fn from(model: FeedPostModel) -> Self {
        FeedPost {
            id: model.id,
            author_id: model.author_id,
            content: model.content,
            image_urls: model.image_urls,
            created_at: model.created_at,
        }
    }
}

impl From<FeedPostViewModel> for FeedPostView {
    fn from(model: FeedPostViewModel) -> Self {
        let author = AuthorSummary {
            id: model.post.author_id,
            username: model.author_username,
            display_name: model.author_display_name,
            avatar_url: model.author_avatar_url,
        };

        FeedPostView {
            post: FeedPost::from(model.post),
            author,
            like_count: model.like_count,
            comment_count: model.comment_count,
            liked_by_me: model.liked_by_me,
        }
    }
}

impl From<CommentViewModel> for CommentView {
    fn from(model: CommentViewModel) -> Self {
        CommentView {
            author: AuthorSummary {
                id: model.author_id,
                username: model.author_username,
                display_name: model.author_display_name,
                avatar_url: model.author_avatar_url,
            },
            comment: PostComment {
                id: model.id,
                post_id: model.post_id,
                author_id: model.author_id,
                content: model.content,
                created_at: model.created_at,
            },
        }
    }
}
