//! # sims-core
//!
//! Domain layer containing entities, value objects, ports, and change events.
//! This crate has no dependencies on infrastructure (database, web framework, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    can_access_feed, generate_invite_code, is_valid_invite_format, AccessRoute, AuthSession,
    AuthorSummary, CommentView, Credential, FeedPost, FeedPostView, Friendship,
    FriendshipRecordStatus, FriendshipStatus, Identity, IdentityMetadata, InviteCode,
    InviteState, InviteStatus, InviteWithProfile, NewNotification, Notification,
    NotificationType, OAuthProvider, PostComment, Profile, PushSubscription,
};
pub use error::DomainError;
pub use events::{AuthEvent, AuthEventKind, ChangeEvent, ChangeKind, Table};
pub use traits::{
    AuthEventStream, AuthProvider, ChangeFeed, ChangeStream, CredentialRepository,
    FriendshipRepository, InviteRepository, NotificationRepository, ObjectStorage,
    PostRepository, ProfileRepository, PushSubscriptionRepository, RefreshTokenRecord,
    RefreshTokenRepository, RepoResult,
};
pub use value_objects::{extract_mentions, render_rich_text, Segment};
