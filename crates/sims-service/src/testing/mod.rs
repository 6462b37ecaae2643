//! Test support: in-memory adapters and a harness wiring them into a
//! [`ServiceContext`]. Enabled for this crate's tests and, through the
//! `testing` feature, for downstream crates.

mod memory;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sims_common::auth::JwtService;
use sims_common::AppConfig;
use sims_core::entities::{FeedPost, OAuthProvider, Profile};
use sims_core::traits::{AuthProvider, PostRepository, ProfileRepository, RepoResult};
use sims_core::DomainError;
use uuid::Uuid;

pub use memory::{
    InMemoryCredentials, InMemoryFriendships, InMemoryInvites, InMemoryNotifications,
    InMemoryPosts, InMemoryProfiles, InMemoryPushSubscriptions, InMemoryRefreshTokens,
    InMemoryStorage,
};

use crate::gateway::{BroadcastChangeFeed, LocalAuthProvider, OAuthClient, OAuthUserInfo};
use crate::services::{ServiceContext, ServiceSettings};

/// OAuth client that answers from a table of registered codes
#[derive(Default)]
pub struct StubOAuthClient {
    codes: Mutex<HashMap<String, OAuthUserInfo>>,
}

impl StubOAuthClient {
    /// A code whose exchange never completes
    pub const HANGING_CODE: &'static str = "hanging-code";

    pub fn register_code(&self, code: &str, email: &str, username: Option<&str>) {
        self.codes.lock().insert(
            code.to_string(),
            OAuthUserInfo {
                email: email.to_string(),
                username: username.map(str::to_string),
                display_name: None,
                avatar_url: None,
            },
        );
    }
}

#[async_trait]
impl OAuthClient for StubOAuthClient {
    fn authorize_url(&self, provider: OAuthProvider, state: &str) -> RepoResult<String> {
        Ok(format!("https://oauth.test/{provider}/authorize?state={state}"))
    }

    async fn exchange_code(
        &self,
        _provider: OAuthProvider,
        code: &str,
    ) -> RepoResult<OAuthUserInfo> {
        if code == Self::HANGING_CODE {
            std::future::pending::<()>().await;
        }
        self.codes
            .lock()
            .get(code)
            .cloned()
            .ok_or_else(|| DomainError::ExternalServiceError(format!("unknown code: {code}")))
    }
}

/// A fully in-memory service context plus handles to its fakes
pub struct TestHarness {
    pub ctx: ServiceContext,
    pub profiles: Arc<InMemoryProfiles>,
    pub invites: Arc<InMemoryInvites>,
    pub posts: Arc<InMemoryPosts>,
    pub notifications: Arc<InMemoryNotifications>,
    pub friendships: Arc<InMemoryFriendships>,
    pub push_subscriptions: Arc<InMemoryPushSubscriptions>,
    pub storage: Arc<InMemoryStorage>,
    pub change_feed: Arc<BroadcastChangeFeed>,
    pub oauth: Arc<StubOAuthClient>,
    pub auth: Arc<LocalAuthProvider>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(ServiceSettings::default())
    }

    pub fn with_admin_emails(emails: &[&str]) -> Self {
        let mut settings = ServiceSettings::default();
        settings.onboarding.admin_emails = emails.iter().map(|e| e.to_string()).collect();
        Self::with_settings(settings)
    }

    pub fn with_callback_timeout(timeout: Duration) -> Self {
        let settings = ServiceSettings {
            oauth_callback_timeout: timeout,
            ..ServiceSettings::default()
        };
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: ServiceSettings) -> Self {
        let config = AppConfig::for_testing();

        let profiles = Arc::new(InMemoryProfiles::default());
        let invites = Arc::new(InMemoryInvites::new(profiles.clone()));
        let posts = Arc::new(InMemoryPosts::new(profiles.clone()));
        let notifications = Arc::new(InMemoryNotifications::default());
        let friendships = Arc::new(InMemoryFriendships::default());
        let push_subscriptions = Arc::new(InMemoryPushSubscriptions::default());
        let storage = Arc::new(InMemoryStorage::new(&config.storage.public_base_url));
        let change_feed = Arc::new(BroadcastChangeFeed::new());
        let oauth = Arc::new(StubOAuthClient::default());

        let jwt = Arc::new(JwtService::new(
            &config.jwt.secret,
            config.jwt.access_token_expiry,
            config.jwt.refresh_token_expiry,
        ));
        let auth = Arc::new(LocalAuthProvider::new(
            Arc::new(InMemoryCredentials::default()),
            Arc::new(InMemoryRefreshTokens::default()),
            jwt.clone(),
            oauth.clone(),
        ));

        let ctx = ServiceContext::new(
            profiles.clone(),
            invites.clone(),
            posts.clone(),
            notifications.clone(),
            friendships.clone(),
            push_subscriptions.clone(),
            change_feed.clone(),
            storage.clone(),
            auth.clone(),
            jwt,
            settings,
        );

        Self {
            ctx,
            profiles,
            invites,
            posts,
            notifications,
            friendships,
            push_subscriptions,
            storage,
            change_feed,
            oauth,
            auth,
        }
    }

    /// Insert a plain profile named `username`
    pub async fn profile(&self, username: &str) -> Profile {
        let profile = Profile::new(Uuid::new_v4(), username.to_string(), username.to_string());
        self.profiles
            .create(&profile)
            .await
            .expect("test profile should insert");
        profile
    }

    /// Insert an admin profile named `username`
    pub async fn admin(&self, username: &str) -> Profile {
        let mut profile = Profile::new(Uuid::new_v4(), username.to_string(), username.to_string());
        profile.is_admin = true;
        self.profiles
            .create(&profile)
            .await
            .expect("test admin should insert");
        profile
    }

    /// Store a text post without publishing it
    pub async fn post(&self, author_id: Uuid, text: &str) -> FeedPost {
        let post = FeedPost::new(author_id, Some(text.to_string()), vec![])
            .expect("test post should be valid");
        self.posts
            .create(&post)
            .await
            .expect("test post should insert");
        post
    }

    /// Begin an OAuth flow and return its id
    pub async fn start_oauth(&self, provider: OAuthProvider) -> String {
        let flow_id = Uuid::new_v4().to_string();
        self.auth
            .authorize_url(provider, &flow_id)
            .await
            .expect("stub authorize url");
        flow_id
    }

    /// Wait until `user_id` has at least `n` notifications. Panics after 2s.
    pub async fn wait_for_notifications(&self, user_id: Uuid, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.notifications.for_user(user_id).len() < n {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {n} notifications"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
