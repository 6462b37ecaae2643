//! Database models - SQLx-compatible structs for PostgreSQL tables

mod credential;
mod friendship;
mod invite;
mod notification;
mod post;
mod profile;
mod push_subscription;

pub use credential::CredentialModel;
pub use friendship::FriendshipModel;
pub use invite::{InviteCodeModel, InviteWithProfileModel};
pub use notification::NotificationModel;
pub use post::{CommentViewModel, FeedPostModel, FeedPostViewModel};
pub use profile::ProfileModel;
pub use push_subscription::PushSubscriptionModel;
