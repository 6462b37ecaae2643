//! Ports implemented by the infrastructure crates

mod ports;
mod repositories;

pub use ports::{AuthEventStream, AuthProvider, ChangeFeed, ChangeStream, ObjectStorage};
pub use repositories::{
    CredentialRepository, FriendshipRepository, InviteRepository, NotificationRepository,
    PostRepository, ProfileRepository, PushSubscriptionRepository, RefreshTokenRecord,
    RefreshTokenRepository, RepoResult,
};
