//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in sims-core.
//! Each repository handles database operations for a specific domain entity.

mod credential;
mod error;
mod friendship;
mod invite;
mod notification;
mod post;
mod profile;
mod push_subscription;

pub use credential::PgCredentialRepository;
pub use friendship::PgFriendshipRepository;
pub use invite::PgInviteRepository;
pub use notification::PgNotificationRepository;
pub use post::PgPostRepository;
pub use profile::PgProfileRepository;
pub use push_subscription::PgPushSubscriptionRepository;
