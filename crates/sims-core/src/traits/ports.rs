//! External collaborators: change feed, object storage, and auth provider

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::entities::{AuthSession, IdentityMetadata, OAuthProvider};
use crate::events::{AuthEvent, ChangeEvent, Table};
use crate::traits::RepoResult;

/// Stream of change events for one table. Dropping it unsubscribes.
pub type ChangeStream = BoxStream<'static, ChangeEvent>;

/// Stream of auth events. Dropping it unsubscribes.
pub type AuthEventStream = BoxStream<'static, AuthEvent>;

// ============================================================================
// Change Feed
// ============================================================================

#[async_trait]
pub trait ChangeFeed: Send + Sync {
    async fn publish(&self, event: ChangeEvent) -> RepoResult<()>;

    async fn subscribe(&self, table: Table) -> RepoResult<ChangeStream>;
}

// ============================================================================
// Object Storage
// ============================================================================

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store bytes at `path`. With `upsert` an existing object is overwritten.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> RepoResult<()>;

    /// Public URL an object is served from
    fn public_url(&self, path: &str) -> String;
}

// ============================================================================
// Auth Provider
// ============================================================================

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: IdentityMetadata,
    ) -> RepoResult<AuthSession>;

    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> RepoResult<AuthSession>;

    /// URL to redirect the browser to. `flow_id` comes back on the callback.
    async fn authorize_url(&self, provider: OAuthProvider, flow_id: &str) -> RepoResult<String>;

    /// Exchange the callback code. Emits `SIGNED_IN` tagged with `flow_id`.
    async fn complete_oauth(
        &self,
        provider: OAuthProvider,
        code: &str,
        flow_id: &str,
    ) -> RepoResult<AuthSession>;

    /// Session already materialized for an OAuth flow, if any
    async fn session_for_flow(&self, flow_id: &str) -> RepoResult<Option<AuthSession>>;

    async fn refresh(&self, refresh_token: &str) -> RepoResult<AuthSession>;

    /// Revoke the refresh token. Emits `SIGNED_OUT`.
    async fn sign_out(&self, refresh_token: &str) -> RepoResult<()>;

    fn events(&self) -> AuthEventStream;
}
