//! Self-hosted auth provider
//!
//! Email/password credentials live in the credential repository; refresh
//! tokens are revocable through the refresh token store. OAuth flows are
//! tracked by flow id so the callback can find the session however it
//! learns about it: from the event stream or by reading it back.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures::{stream, StreamExt};
use sims_common::auth::{hash_password, verify_password, JwtService, TokenPair};
use sims_common::AppError;
use sims_core::entities::{AuthSession, Credential, Identity, IdentityMetadata, OAuthProvider};
use sims_core::traits::{
    AuthEventStream, AuthProvider, CredentialRepository, RefreshTokenRecord,
    RefreshTokenRepository, RepoResult,
};
use sims_core::{AuthEvent, AuthEventKind, DomainError};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::ValidateEmail;

use super::oauth_client::{OAuthClient, OAuthUserInfo};

const EVENT_CAPACITY: usize = 256;

/// Flows not completed within this window are forgotten
const FLOW_TTL_MINUTES: i64 = 10;

#[derive(Debug, Clone)]
enum FlowState {
    Pending {
        provider: OAuthProvider,
        started_at: DateTime<Utc>,
    },
    Complete {
        session: AuthSession,
        started_at: DateTime<Utc>,
    },
}

impl FlowState {
    fn started_at(&self) -> DateTime<Utc> {
        match self {
            Self::Pending { started_at, .. } | Self::Complete { started_at, .. } => *started_at,
        }
    }
}

pub struct LocalAuthProvider {
    credentials: Arc<dyn CredentialRepository>,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
    jwt: Arc<JwtService>,
    oauth: Arc<dyn OAuthClient>,
    flows: DashMap<String, FlowState>,
    events: broadcast::Sender<AuthEvent>,
}

impl LocalAuthProvider {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
        jwt: Arc<JwtService>,
        oauth: Arc<dyn OAuthClient>,
    ) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            credentials,
            refresh_tokens,
            jwt,
            oauth,
            flows: DashMap::new(),
            events,
        }
    }

    /// Live event stream subscriptions
    pub fn event_subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn emit(&self, event: AuthEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn prune_flows(&self) {
        let cutoff = Utc::now() - Duration::minutes(FLOW_TTL_MINUTES);
        self.flows.retain(|_, flow| flow.started_at() > cutoff);
    }

    /// Mint tokens and register the refresh token
    async fn issue(
        &self,
        identity: Identity,
        session_id: Option<String>,
    ) -> RepoResult<AuthSession> {
        let pair: TokenPair = match session_id {
            Some(session_id) => self
                .jwt
                .generate_token_pair_for_session(identity.id, session_id),
            None => self.jwt.generate_token_pair(identity.id),
        }
        .map_err(from_app_error)?;

        let record = RefreshTokenRecord {
            user_id: identity.id,
            session_id: pair.session_id.clone(),
        };
        let ttl = u64::try_from(self.jwt.refresh_token_expiry()).unwrap_or(0);
        self.refresh_tokens
            .store(&pair.refresh_token, &record, ttl)
            .await?;

        Ok(AuthSession {
            identity,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        })
    }

    /// Existing credential for the email, or a new password-less one
    async fn find_or_create_oauth_credential(
        &self,
        provider: OAuthProvider,
        info: OAuthUserInfo,
    ) -> RepoResult<Credential> {
        let email = normalize_email(&info.email);
        if let Some(existing) = self.credentials.find_by_email(&email).await? {
            return Ok(existing);
        }

        let credential = Credential {
            user_id: Uuid::new_v4(),
            email: email.clone(),
            password_hash: None,
            metadata: IdentityMetadata {
                username: info.username,
                display_name: info.display_name,
                avatar_url: info.avatar_url,
                provider: Some(provider.to_string()),
            },
            created_at: Utc::now(),
        };

        match self.credentials.create(&credential).await {
            Ok(()) => {
                info!(user_id = %credential.user_id, provider = %provider, "OAuth identity created");
                Ok(credential)
            }
            // Lost a race with a concurrent first sign-in
            Err(DomainError::EmailAlreadyExists) => self
                .credentials
                .find_by_email(&email)
                .await?
                .ok_or(DomainError::InvalidCredentials),
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for LocalAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAuthProvider")
            .field("flows", &self.flows.len())
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

fn from_app_error(err: AppError) -> DomainError {
    match err {
        AppError::InvalidToken | AppError::TokenExpired => DomainError::InvalidToken,
        AppError::InvalidCredentials => DomainError::InvalidCredentials,
        AppError::Domain(e) => e,
        other => DomainError::InternalError(other.to_string()),
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    #[instrument(skip(self, password, metadata))]
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: IdentityMetadata,
    ) -> RepoResult<AuthSession> {
        let email = normalize_email(email);
        if !email.validate_email() {
            return Err(DomainError::InvalidEmail);
        }
        if self.credentials.find_by_email(&email).await?.is_some() {
            return Err(DomainError::EmailAlreadyExists);
        }

        let credential = Credential {
            user_id: Uuid::new_v4(),
            email,
            password_hash: Some(hash_password(password).map_err(from_app_error)?),
            metadata,
            created_at: Utc::now(),
        };
        self.credentials.create(&credential).await?;

        let session = self.issue(credential.identity(), None).await?;
        self.emit(AuthEvent::signed_in(session.clone(), None));
        Ok(session)
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(&self, email: &str, password: &str) -> RepoResult<AuthSession> {
        let credential = self
            .credentials
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        // OAuth-only identities have no password to check
        let hash = credential
            .password_hash
            .as_deref()
            .ok_or(DomainError::InvalidCredentials)?;
        if !verify_password(password, hash).map_err(from_app_error)? {
            warn!(user_id = %credential.user_id, "Password mismatch");
            return Err(DomainError::InvalidCredentials);
        }

        let session = self.issue(credential.identity(), None).await?;
        self.emit(AuthEvent::signed_in(session.clone(), None));
        Ok(session)
    }

    async fn authorize_url(&self, provider: OAuthProvider, flow_id: &str) -> RepoResult<String> {
        let url = self.oauth.authorize_url(provider, flow_id)?;
        self.prune_flows();
        self.flows.insert(
            flow_id.to_string(),
            FlowState::Pending {
                provider,
                started_at: Utc::now(),
            },
        );
        debug!(flow_id, provider = %provider, "OAuth flow started");
        Ok(url)
    }

    #[instrument(skip(self, code))]
    async fn complete_oauth(
        &self,
        provider: OAuthProvider,
        code: &str,
        flow_id: &str,
    ) -> RepoResult<AuthSession> {
        let started_at = match self.flows.get(flow_id).map(|f| f.value().clone()) {
            Some(FlowState::Pending {
                provider: expected,
                started_at,
            }) if expected == provider => started_at,
            Some(FlowState::Complete { session, .. }) => return Ok(session),
            _ => return Err(DomainError::InvalidToken),
        };

        let info = match self.oauth.exchange_code(provider, code).await {
            Ok(info) => info,
            Err(e) => {
                self.flows.remove(flow_id);
                return Err(e);
            }
        };

        let credential = self.find_or_create_oauth_credential(provider, info).await?;
        let session = self.issue(credential.identity(), None).await?;

        self.flows.insert(
            flow_id.to_string(),
            FlowState::Complete {
                session: session.clone(),
                started_at,
            },
        );
        self.emit(AuthEvent::signed_in(
            session.clone(),
            Some(flow_id.to_string()),
        ));
        Ok(session)
    }

    async fn session_for_flow(&self, flow_id: &str) -> RepoResult<Option<AuthSession>> {
        Ok(self.flows.get(flow_id).and_then(|flow| match flow.value() {
            FlowState::Complete { session, .. } => Some(session.clone()),
            FlowState::Pending { .. } => None,
        }))
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &str) -> RepoResult<AuthSession> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(from_app_error)?;
        let record = self
            .refresh_tokens
            .validate(refresh_token)
            .await?
            .filter(|r| r.user_id == claims.user_id())
            .ok_or(DomainError::InvalidToken)?;

        let credential = self
            .credentials
            .find_by_id(record.user_id)
            .await?
            .ok_or(DomainError::InvalidToken)?;

        self.refresh_tokens.revoke(refresh_token).await?;
        let session = self
            .issue(credential.identity(), Some(record.session_id))
            .await?;

        self.emit(AuthEvent {
            kind: AuthEventKind::TokenRefreshed,
            session: Some(session.clone()),
            flow_id: None,
        });
        Ok(session)
    }

    async fn sign_out(&self, refresh_token: &str) -> RepoResult<()> {
        self.refresh_tokens.revoke(refresh_token).await?;
        self.emit(AuthEvent::signed_out());
        Ok(())
    }

    fn events(&self) -> AuthEventStream {
        let rx = self.events.subscribe();
        stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(event) => return Some((event, rx)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth event stream lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[tokio::test]
    async fn test_sign_up_rejects_invalid_email() {
        let h = TestHarness::new();
        let err = h
            .auth
            .sign_up("not-an-email", "Password123", IdentityMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidEmail));
    }

    #[tokio::test]
    async fn test_complete_oauth_emits_signed_in_for_flow() {
        let h = TestHarness::new();
        h.oauth
            .register_code("code-1", "Bella@Goth.sim", Some("bella"));
        let flow_id = h.start_oauth(OAuthProvider::Discord).await;

        let mut events = h.auth.events();
        let session = h
            .auth
            .complete_oauth(OAuthProvider::Discord, "code-1", &flow_id)
            .await
            .unwrap();
        assert_eq!(session.identity.email, "bella@goth.sim");
        assert_eq!(
            session.identity.metadata.provider.as_deref(),
            Some("discord")
        );

        let event = events.next().await.unwrap();
        assert!(event.is_sign_in_for(&flow_id));
    }

    #[tokio::test]
    async fn test_oauth_reuses_existing_identity() {
        let h = TestHarness::new();
        h.oauth.register_code("code-1", "bella@goth.sim", None);
        h.oauth.register_code("code-2", "bella@goth.sim", None);

        let first_flow = h.start_oauth(OAuthProvider::Google).await;
        let first = h
            .auth
            .complete_oauth(OAuthProvider::Google, "code-1", &first_flow)
            .await
            .unwrap();
        let second_flow = h.start_oauth(OAuthProvider::Google).await;
        let second = h
            .auth
            .complete_oauth(OAuthProvider::Google, "code-2", &second_flow)
            .await
            .unwrap();

        assert_eq!(first.identity.id, second.identity.id);
    }

    #[tokio::test]
    async fn test_provider_mismatch_is_rejected() {
        let h = TestHarness::new();
        h.oauth.register_code("code-1", "bella@goth.sim", None);
        let flow_id = h.start_oauth(OAuthProvider::Google).await;

        let err = h
            .auth
            .complete_oauth(OAuthProvider::Discord, "code-1", &flow_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidToken));
        assert!(h.auth.session_for_flow(&flow_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oauth_only_identity_cannot_use_password() {
        let h = TestHarness::new();
        h.oauth.register_code("code-1", "bella@goth.sim", None);
        let flow_id = h.start_oauth(OAuthProvider::Google).await;
        h.auth
            .complete_oauth(OAuthProvider::Google, "code-1", &flow_id)
            .await
            .unwrap();

        let err = h
            .auth
            .sign_in_with_password("bella@goth.sim", "Password123")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidCredentials));
    }
}
