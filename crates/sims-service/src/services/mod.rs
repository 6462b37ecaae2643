//! Business logic services
//!
//! Onboarding (auth, bootstrap, invites), the social graph, posts and the
//! notification fan-out, plus the per-connection feed and session state
//! the realtime gateway drives.

pub mod auth;
pub mod bootstrap;
pub mod context;
pub mod error;
pub mod feed;
pub mod friendship;
pub mod invite;
pub mod mention;
pub mod notification;
pub mod oauth_callback;
pub mod post;
pub mod profile;
pub mod push_subscription;
pub mod session;

// Re-export all services for convenience
pub use auth::{session_response, AuthService};
pub use bootstrap::{BootstrapOutcome, BootstrapService};
pub use context::{ServiceContext, ServiceContextBuilder, ServiceSettings};
pub use error::{ServiceError, ServiceResult};
pub use feed::{FeedBuffer, FeedPager, PageLoad};
pub use friendship::FriendshipService;
pub use invite::InviteService;
pub use mention::process_mentions;
pub use notification::{NotificationDispatcher, NotificationService};
pub use oauth_callback::{CallbackOutcome, OAuthCallbackService, SessionWait};
pub use post::PostService;
pub use profile::ProfileService;
pub use push_subscription::PushSubscriptionService;
pub use session::{Session, SessionStore, SessionView};
