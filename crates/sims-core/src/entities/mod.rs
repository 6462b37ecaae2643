//! Domain entities - core business objects

mod friendship;
mod identity;
mod invite;
mod notification;
mod post;
mod profile;
mod push_subscription;

pub use friendship::{Friendship, FriendshipRecordStatus, FriendshipStatus};
pub use identity::{AuthSession, Credential, Identity, IdentityMetadata, OAuthProvider};
pub use invite::{
    can_access_feed, generate_invite_code, is_valid_invite_format, AccessRoute, InviteCode,
    InviteState, InviteStatus, InviteWithProfile, INVITE_ALPHABET,
};
pub use notification::{truncate_preview, NewNotification, Notification, NotificationType};
pub use post::{AuthorSummary, CommentView, FeedPost, FeedPostView, PostComment};
pub use profile::Profile;
pub use push_subscription::PushSubscription;
