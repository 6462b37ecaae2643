//! Adapters for the auth and change-feed ports that live in-process
//!
//! [`LocalAuthProvider`] issues sessions from stored credentials and OAuth
//! code exchanges; [`BroadcastChangeFeed`] is a single-process change feed.

mod broadcast_feed;
mod local_auth;
mod oauth_client;

pub use broadcast_feed::BroadcastChangeFeed;
pub use local_auth::LocalAuthProvider;
pub use oauth_client::{HttpOAuthClient, OAuthClient, OAuthUserInfo};
