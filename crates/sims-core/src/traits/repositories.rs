//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{
    CommentView, Credential, FeedPost, FeedPostView, Friendship, InviteCode, InviteStatus,
    InviteWithProfile, Notification, PostComment, Profile, PushSubscription,
};
use crate::error::DomainError;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Profile Repository
// ============================================================================

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find profile by id
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Profile>>;

    /// Find profile by exact username (including any tag)
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<Profile>>;

    /// Resolve usernames to ids. Unknown names are absent from the map.
    async fn resolve_usernames(&self, usernames: &[String]) -> RepoResult<HashMap<String, Uuid>>;

    /// Insert a profile. Fails with `ProfileAlreadyExists` or `UsernameTaken`.
    async fn create(&self, profile: &Profile) -> RepoResult<()>;

    /// Overwrite all mutable fields
    async fn update(&self, profile: &Profile) -> RepoResult<()>;

    /// Set `invite_code_used` only when it is still empty. Returns whether a write happened.
    async fn set_invite_code_used_if_empty(&self, id: Uuid, code: &str) -> RepoResult<bool>;
}

// ============================================================================
// Invite Repository
// ============================================================================

#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Insert a pending invite. Fails with `InviteCodeExists` on a code
    /// collision and `InviteAlreadyExists` when the owner already has one.
    async fn create(&self, invite: &InviteCode) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<InviteCode>>;

    /// Latest invite for a user by `created_at`
    async fn find_latest_for_user(&self, user_id: Uuid) -> RepoResult<Option<InviteCode>>;

    /// Persist status, `approved_by` and `approved_at`
    async fn update_status(&self, invite: &InviteCode) -> RepoResult<()>;

    /// Newest first, optionally filtered by status
    async fn list(&self, status: Option<InviteStatus>) -> RepoResult<Vec<InviteWithProfile>>;
}

// ============================================================================
// Post Repository
// ============================================================================

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: &FeedPost) -> RepoResult<()>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<FeedPost>>;

    async fn delete(&self, id: Uuid) -> RepoResult<()>;

    /// Joined representation of one post for a viewer
    async fn find_view(&self, id: Uuid, viewer_id: Uuid) -> RepoResult<Option<FeedPostView>>;

    /// Newest first
    async fn list_feed(
        &self,
        viewer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<FeedPostView>>;

    async fn add_comment(&self, comment: &PostComment) -> RepoResult<()>;

    /// Oldest first
    async fn list_comments(&self, post_id: Uuid) -> RepoResult<Vec<CommentView>>;

    /// Returns `false` if the like already existed
    async fn like(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool>;

    /// Returns `false` if there was nothing to remove
    async fn unlike(&self, post_id: Uuid, user_id: Uuid) -> RepoResult<bool>;
}

// ============================================================================
// Notification Repository
// ============================================================================

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> RepoResult<()>;

    /// Newest first
    async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<Notification>>;

    /// Returns `false` if no notification with that id belongs to the user
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> RepoResult<bool>;

    /// Returns the number of rows flipped
    async fn mark_all_read(&self, user_id: Uuid) -> RepoResult<u64>;

    async fn unread_count(&self, user_id: Uuid) -> RepoResult<i64>;
}

// ============================================================================
// Friendship Repository
// ============================================================================

#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// The row between two users in either direction
    async fn find_between(&self, a: Uuid, b: Uuid) -> RepoResult<Option<Friendship>>;

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Friendship>>;

    /// Fails with `FriendshipExists` if a row already links the pair
    async fn create(&self, friendship: &Friendship) -> RepoResult<()>;

    async fn accept(&self, id: Uuid) -> RepoResult<()>;

    async fn delete(&self, id: Uuid) -> RepoResult<()>;

    /// Accepted friendships involving the user
    async fn list_accepted(&self, user_id: Uuid) -> RepoResult<Vec<Friendship>>;

    /// Pending requests addressed to the user
    async fn list_incoming(&self, user_id: Uuid) -> RepoResult<Vec<Friendship>>;
}

// ============================================================================
// Push Subscription Repository
// ============================================================================

#[async_trait]
pub trait PushSubscriptionRepository: Send + Sync {
    /// Insert, or replace keys and owner when the endpoint is already known
    async fn upsert(&self, subscription: &PushSubscription) -> RepoResult<()>;

    async fn list_for_user(&self, user_id: Uuid) -> RepoResult<Vec<PushSubscription>>;

    /// Returns `false` if nothing matched
    async fn delete_by_endpoint(&self, endpoint: &str) -> RepoResult<bool>;
}

// ============================================================================
// Credential Repository
// ============================================================================

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Credential>>;

    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<Credential>>;

    /// Fails with `EmailAlreadyExists`
    async fn create(&self, credential: &Credential) -> RepoResult<()>;
}

// ============================================================================
// Refresh Token Repository
// ============================================================================

/// Data kept for a live refresh token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub session_id: String,
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn store(&self, token: &str, record: &RefreshTokenRecord, ttl_secs: u64)
        -> RepoResult<()>;

    /// The record for a token that is still live
    async fn validate(&self, token: &str) -> RepoResult<Option<RefreshTokenRecord>>;

    async fn revoke(&self, token: &str) -> RepoResult<()>;
}
