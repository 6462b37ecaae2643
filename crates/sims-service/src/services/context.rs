//! Service context - dependency container for services
//!
//! Holds the repositories, the change feed, object storage and the auth
//! provider needed by services.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sims_cache::{RedisChangeFeed, RedisPool, RefreshTokenStore};
use sims_common::auth::JwtService;
use sims_common::{AppConfig, OnboardingConfig};
use sims_core::traits::{
    AuthProvider, ChangeFeed, FriendshipRepository, InviteRepository, NotificationRepository,
    ObjectStorage, PostRepository, ProfileRepository, PushSubscriptionRepository,
};
use sims_core::{ChangeEvent, ChangeKind, Table};
use sims_db::{
    LocalObjectStorage, PgCredentialRepository, PgFriendshipRepository, PgInviteRepository,
    PgNotificationRepository, PgPostRepository, PgProfileRepository, PgPushSubscriptionRepository,
};
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use super::notification::NotificationDispatcher;
use crate::gateway::{HttpOAuthClient, LocalAuthProvider};

/// Tunables the services read at runtime
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub onboarding: OnboardingConfig,
    /// How long an OAuth callback waits for its session
    pub oauth_callback_timeout: Duration,
    /// Where the browser is sent after an OAuth callback
    pub app_redirect_base: String,
    pub feed_page_size: i64,
    pub max_upload_bytes: usize,
}

impl ServiceSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            onboarding: config.onboarding.clone(),
            oauth_callback_timeout: Duration::from_secs(config.oauth.callback_timeout_secs),
            app_redirect_base: config.oauth.app_redirect_base.clone(),
            feed_page_size: config.feed.page_size,
            max_upload_bytes: config.storage.max_file_size_bytes(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::for_testing())
    }
}

/// Service context containing all dependencies
///
/// This is the main dependency container that gets passed to all services.
/// It provides access to:
/// - Repositories behind their domain ports
/// - The change feed used for realtime delivery
/// - Object storage for avatars
/// - The auth provider and JWT service
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    profile_repo: Arc<dyn ProfileRepository>,
    invite_repo: Arc<dyn InviteRepository>,
    post_repo: Arc<dyn PostRepository>,
    notification_repo: Arc<dyn NotificationRepository>,
    friendship_repo: Arc<dyn FriendshipRepository>,
    push_subscription_repo: Arc<dyn PushSubscriptionRepository>,

    // Collaborators
    change_feed: Arc<dyn ChangeFeed>,
    storage: Arc<dyn ObjectStorage>,
    auth_provider: Arc<dyn AuthProvider>,

    // Services
    jwt_service: Arc<JwtService>,
    notifier: NotificationDispatcher,

    settings: Arc<ServiceSettings>,
}

impl ServiceContext {
    /// Create a new service context with all dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        profile_repo: Arc<dyn ProfileRepository>,
        invite_repo: Arc<dyn InviteRepository>,
        post_repo: Arc<dyn PostRepository>,
        notification_repo: Arc<dyn NotificationRepository>,
        friendship_repo: Arc<dyn FriendshipRepository>,
        push_subscription_repo: Arc<dyn PushSubscriptionRepository>,
        change_feed: Arc<dyn ChangeFeed>,
        storage: Arc<dyn ObjectStorage>,
        auth_provider: Arc<dyn AuthProvider>,
        jwt_service: Arc<JwtService>,
        settings: ServiceSettings,
    ) -> Self {
        let notifier = NotificationDispatcher::new(
            notification_repo.clone(),
            profile_repo.clone(),
            change_feed.clone(),
        );

        Self {
            profile_repo,
            invite_repo,
            post_repo,
            notification_repo,
            friendship_repo,
            push_subscription_repo,
            change_feed,
            storage,
            auth_provider,
            jwt_service,
            notifier,
            settings: Arc::new(settings),
        }
    }

    /// Wire a context against PostgreSQL, Redis and local storage
    pub async fn connect(config: &AppConfig) -> ServiceResult<Self> {
        let pool = sims_db::create_pool(&sims_db::DatabaseConfig::from_app(&config.database))
            .await
            .map_err(|e| ServiceError::internal(format!("database: {e}")))?;

        if config.database.run_migrations {
            sims_db::run_migrations(&pool)
                .await
                .map_err(|e| ServiceError::internal(format!("migrations: {e}")))?;
            info!("Database migrations applied");
        }

        let redis = RedisPool::from_config(&config.redis)
            .map_err(|e| ServiceError::internal(format!("redis: {e}")))?;

        let storage = LocalObjectStorage::new(
            config.storage.upload_dir.clone(),
            &config.storage.public_base_url,
        )
        .await?;

        let jwt_service = Arc::new(JwtService::new(
            &config.jwt.secret,
            config.jwt.access_token_expiry,
            config.jwt.refresh_token_expiry,
        ));

        let oauth_client = HttpOAuthClient::new(config.oauth.clone(), &config.api.public_url)?;
        let auth_provider = LocalAuthProvider::new(
            Arc::new(PgCredentialRepository::new(pool.clone())),
            Arc::new(RefreshTokenStore::new(redis.clone())),
            jwt_service.clone(),
            Arc::new(oauth_client),
        );

        Ok(Self::new(
            Arc::new(PgProfileRepository::new(pool.clone())),
            Arc::new(PgInviteRepository::new(pool.clone())),
            Arc::new(PgPostRepository::new(pool.clone())),
            Arc::new(PgNotificationRepository::new(pool.clone())),
            Arc::new(PgFriendshipRepository::new(pool.clone())),
            Arc::new(PgPushSubscriptionRepository::new(pool)),
            Arc::new(RedisChangeFeed::connect(redis)),
            Arc::new(storage),
            Arc::new(auth_provider),
            jwt_service,
            ServiceSettings::from_config(config),
        ))
    }

    // === Repositories ===

    /// Get the profile repository
    pub fn profile_repo(&self) -> &dyn ProfileRepository {
        self.profile_repo.as_ref()
    }

    /// Get the invite repository
    pub fn invite_repo(&self) -> &dyn InviteRepository {
        self.invite_repo.as_ref()
    }

    /// Get the post repository
    pub fn post_repo(&self) -> &dyn PostRepository {
        self.post_repo.as_ref()
    }

    /// Shared handle to the post repository, for long-lived feed buffers
    pub fn post_repo_arc(&self) -> Arc<dyn PostRepository> {
        self.post_repo.clone()
    }

    /// Get the notification repository
    pub fn notification_repo(&self) -> &dyn NotificationRepository {
        self.notification_repo.as_ref()
    }

    /// Get the friendship repository
    pub fn friendship_repo(&self) -> &dyn FriendshipRepository {
        self.friendship_repo.as_ref()
    }

    /// Get the push subscription repository
    pub fn push_subscription_repo(&self) -> &dyn PushSubscriptionRepository {
        self.push_subscription_repo.as_ref()
    }

    // === Collaborators ===

    /// Get the change feed
    pub fn change_feed(&self) -> &dyn ChangeFeed {
        self.change_feed.as_ref()
    }

    /// Shared handle to the change feed
    pub fn change_feed_arc(&self) -> Arc<dyn ChangeFeed> {
        self.change_feed.clone()
    }

    /// Get the object storage
    pub fn storage(&self) -> &dyn ObjectStorage {
        self.storage.as_ref()
    }

    /// Get the auth provider
    pub fn auth_provider(&self) -> &dyn AuthProvider {
        self.auth_provider.as_ref()
    }

    /// Shared handle to the auth provider, for background exchanges
    pub fn auth_provider_arc(&self) -> Arc<dyn AuthProvider> {
        self.auth_provider.clone()
    }

    // === Services ===

    /// Get the JWT service
    pub fn jwt_service(&self) -> &JwtService {
        self.jwt_service.as_ref()
    }

    /// Get the fire-and-forget notification dispatcher
    pub fn notifier(&self) -> &NotificationDispatcher {
        &self.notifier
    }

    /// Get the runtime settings
    pub fn settings(&self) -> &ServiceSettings {
        self.settings.as_ref()
    }

    // === Change Events ===

    /// Announce a row change. Publishing is best effort.
    pub async fn publish_change<T: Serialize>(&self, table: Table, kind: ChangeKind, record: &T) {
        let event = match ChangeEvent::new(table, kind, record) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, table = %table, "Failed to encode change event");
                return;
            }
        };
        if let Err(e) = self.change_feed.publish(event).await {
            warn!(error = %e, table = %table, "Failed to publish change event");
        }
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &"...")
            .field("change_feed", &"ChangeFeed")
            .field("auth_provider", &"AuthProvider")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Builder for creating ServiceContext with custom configuration
pub struct ServiceContextBuilder {
    profile_repo: Option<Arc<dyn ProfileRepository>>,
    invite_repo: Option<Arc<dyn InviteRepository>>,
    post_repo: Option<Arc<dyn PostRepository>>,
    notification_repo: Option<Arc<dyn NotificationRepository>>,
    friendship_repo: Option<Arc<dyn FriendshipRepository>>,
    push_subscription_repo: Option<Arc<dyn PushSubscriptionRepository>>,
    change_feed: Option<Arc<dyn ChangeFeed>>,
    storage: Option<Arc<dyn ObjectStorage>>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    jwt_service: Option<Arc<JwtService>>,
    settings: Option<ServiceSettings>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self {
            profile_repo: None,
            invite_repo: None,
            post_repo: None,
            notification_repo: None,
            friendship_repo: None,
            push_subscription_repo: None,
            change_feed: None,
            storage: None,
            auth_provider: None,
            jwt_service: None,
            settings: None,
        }
    }

    pub fn profile_repo(mut self, repo: Arc<dyn ProfileRepository>) -> Self {
        self.profile_repo = Some(repo);
        self
    }

    pub fn invite_repo(mut self, repo: Arc<dyn InviteRepository>) -> Self {
        self.invite_repo = Some(repo);
        self
    }

    pub fn post_repo(mut self, repo: Arc<dyn PostRepository>) -> Self {
        self.post_repo = Some(repo);
        self
    }

    pub fn notification_repo(mut self, repo: Arc<dyn NotificationRepository>) -> Self {
        self.notification_repo = Some(repo);
        self
    }

    pub fn friendship_repo(mut self, repo: Arc<dyn FriendshipRepository>) -> Self {
        self.friendship_repo = Some(repo);
        self
    }

    pub fn push_subscription_repo(mut self, repo: Arc<dyn PushSubscriptionRepository>) -> Self {
        self.push_subscription_repo = Some(repo);
        self
    }

    pub fn change_feed(mut self, feed: Arc<dyn ChangeFeed>) -> Self {
        self.change_feed = Some(feed);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn auth_provider(mut self, provider: Arc<dyn AuthProvider>) -> Self {
        self.auth_provider = Some(provider);
        self
    }

    pub fn jwt_service(mut self, service: Arc<JwtService>) -> Self {
        self.jwt_service = Some(service);
        self
    }

    pub fn settings(mut self, settings: ServiceSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        Ok(ServiceContext::new(
            self.profile_repo.ok_or_else(|| ServiceError::validation("profile_repo is required"))?,
            self.invite_repo.ok_or_else(|| ServiceError::validation("invite_repo is required"))?,
            self.post_repo.ok_or_else(|| ServiceError::validation("post_repo is required"))?,
            self.notification_repo
                .ok_or_else(|| ServiceError::validation("notification_repo is required"))?,
            self.friendship_repo
                .ok_or_else(|| ServiceError::validation("friendship_repo is required"))?,
            self.push_subscription_repo
                .ok_or_else(|| ServiceError::validation("push_subscription_repo is required"))?,
            self.change_feed.ok_or_else(|| ServiceError::validation("change_feed is required"))?,
            self.storage.ok_or_else(|| ServiceError::validation("storage is required"))?,
            self.auth_provider
                .ok_or_else(|| ServiceError::validation("auth_provider is required"))?,
            self.jwt_service.ok_or_else(|| ServiceError::validation("jwt_service is required"))?,
            self.settings.unwrap_or_default(),
        ))
    }
}

impl Default for ServiceContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
