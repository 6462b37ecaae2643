//! Entity to DTO mappers
//!
//! Implements `From` conversions from domain entities to response DTOs.

use sims_core::entities::{
    AuthorSummary, CommentView, FeedPostView, Friendship, InviteCode, InviteWithProfile,
    Notification, Profile, PushSubscription,
};
use sims_core::{render_rich_text, FriendshipStatus};

use super::responses::{
    AdminInviteResponse, AuthorResponse, CommentResponse, InviteResponse, NotificationResponse,
    PostResponse, ProfileResponse, PublicProfileResponse, PushSubscriptionResponse,
};

// ============================================================================
// Profile Mappers
// ============================================================================

impl From<&Profile> for ProfileResponse {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id,
            username: p.username.clone(),
            display_name: p.display_name.clone(),
            avatar_url: p.avatar_url.clone(),
            banner_url: p.banner_url.clone(),
            bio: p.bio.clone(),
            website: p.website.clone(),
            is_admin: p.is_admin,
            invite_code_used: p.invite_code_used.clone(),
            tag_changed: p.tag_changed,
            zen_background: p.zen_background.clone(),
            created_at: p.created_at,
        }
    }
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self::from(&p)
    }
}

impl PublicProfileResponse {
    pub fn from_profile(p: &Profile, friendship: FriendshipStatus) -> Self {
        Self {
            id: p.id,
            username: p.username.clone(),
            display_name: p.display_name.clone(),
            avatar_url: p.avatar_url.clone(),
            banner_url: p.banner_url.clone(),
            bio: p.bio.clone(),
            website: p.website.clone(),
            zen_background: p.zen_background.clone(),
            created_at: p.created_at,
            friendship,
        }
    }
}

impl From<&AuthorSummary> for AuthorResponse {
    fn from(a: &AuthorSummary) -> Self {
        Self {
            id: a.id,
            username: a.username.clone(),
            display_name: a.display_name.clone(),
            avatar_url: a.avatar_url.clone(),
        }
    }
}

impl From<&Profile> for AuthorResponse {
    fn from(p: &Profile) -> Self {
        Self {
            id: p.id,
            username: p.username.clone(),
            display_name: p.display_name.clone(),
            avatar_url: p.avatar_url.clone(),
        }
    }
}

// ============================================================================
// Invite Mappers
// ============================================================================

impl From<&InviteCode> for InviteResponse {
    fn from(i: &InviteCode) -> Self {
        Self {
            id: i.id,
            code: i.code.clone(),
            status: i.status,
            approved_by: i.approved_by,
            approved_at: i.approved_at,
            created_at: i.created_at,
        }
    }
}

impl From<&InviteWithProfile> for AdminInviteResponse {
    fn from(row: &InviteWithProfile) -> Self {
        Self {
            invite: InviteResponse::from(&row.invite),
            used_by: row.invite.used_by,
            username: row.username.clone(),
            display_name: row.display_name.clone(),
            avatar_url: row.avatar_url.clone(),
        }
    }
}

// ============================================================================
// Post Mappers
// ============================================================================

impl From<&FeedPostView> for PostResponse {
    fn from(view: &FeedPostView) -> Self {
        let segments = view
            .post
            .content
            .as_deref()
            .map(render_rich_text)
            .unwrap_or_default();

        Self {
            id: view.post.id,
            author: AuthorResponse::from(&view.author),
            content: view.post.content.clone(),
            segments,
            image_urls: view.post.image_urls.clone(),
            like_count: view.like_count,
            comment_count: view.comment_count,
            liked_by_me: view.liked_by_me,
            created_at: view.post.created_at,
        }
    }
}

impl From<&CommentView> for CommentResponse {
    fn from(view: &CommentView) -> Self {
        Self {
            id: view.comment.id,
            post_id: view.comment.post_id,
            author: AuthorResponse::from(&view.author),
            content: view.comment.content.clone(),
            segments: render_rich_text(&view.comment.content),
            created_at: view.comment.created_at,
        }
    }
}

// ============================================================================
// Notification / Friendship / Push Mappers
// ============================================================================

impl From<&Notification> for NotificationResponse {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            notification_type: n.notification_type,
            actor_id: n.actor_id,
            content: n.content.clone(),
            reference_id: n.reference_id,
            read: n.read,
            created_at: n.created_at,
        }
    }
}

impl super::responses::FriendshipResponse {
    /// The row as seen by `viewer`
    pub fn for_viewer(f: &Friendship, viewer: uuid::Uuid) -> Self {
        Self {
            id: f.id,
            user_id: f.other_party(viewer),
            status: f.status_for(viewer),
            created_at: f.created_at,
        }
    }
}

impl From<&PushSubscription> for PushSubscriptionResponse {
    fn from(s: &PushSubscription) -> Self {
        Self {
            id: s.id,
            endpoint: s.endpoint.clone(),
            created_at: s.created_at,
        }
    }
}
