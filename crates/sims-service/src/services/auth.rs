//! Authentication service
//!
//! Orchestrates sign-up, sign-in (email and OAuth), token refresh and
//! sign-out against the auth provider, running the first-login bootstrap
//! so every session comes back with a profile and a route.

use sims_common::auth::validate_password_strength;
use sims_core::entities::{AuthSession, IdentityMetadata, OAuthProvider, Profile};
use sims_core::{AccessRoute, ChangeKind, DomainError, InviteState, Table};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::dto::{
    CreateProfileRequest, MeResponse, OAuthStartResponse, ProfileResponse, RefreshTokenRequest,
    SessionResponse, SignInRequest, SignOutRequest, SignUpRequest,
};

use super::bootstrap::{BootstrapOutcome, BootstrapService};
use super::context::ServiceContext;
use super::error::ServiceResult;

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register with email and password, then bootstrap
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_up_with_email(&self, request: SignUpRequest) -> ServiceResult<SessionResponse> {
        validate_password_strength(&request.password)?;

        let metadata = IdentityMetadata {
            username: request.username,
            display_name: request.display_name,
            avatar_url: None,
            provider: Some("email".to_string()),
        };

        let session = self
            .ctx
            .auth_provider()
            .sign_up(&request.email, &request.password, metadata)
            .await?;
        info!(user_id = %session.identity.id, "User signed up");

        self.complete(session).await
    }

    /// Sign in with email and password, then bootstrap
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn sign_in_with_email(&self, request: SignInRequest) -> ServiceResult<SessionResponse> {
        let session = self
            .ctx
            .auth_provider()
            .sign_in_with_password(&request.email, &request.password)
            .await
            .inspect_err(|e| warn!(error = %e, "Sign-in failed"))?;
        info!(user_id = %session.identity.id, "User signed in");

        self.complete(session).await
    }

    /// Start an OAuth flow. The returned flow id comes back as `state`.
    #[instrument(skip(self))]
    pub async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
    ) -> ServiceResult<OAuthStartResponse> {
        let flow_id = Uuid::new_v4().to_string();
        let authorize_url = self
            .ctx
            .auth_provider()
            .authorize_url(provider, &flow_id)
            .await?;

        Ok(OAuthStartResponse {
            authorize_url,
            flow_id,
        })
    }

    /// Rotate a refresh token
    #[instrument(skip(self, request))]
    pub async fn refresh(&self, request: RefreshTokenRequest) -> ServiceResult<SessionResponse> {
        let session = self
            .ctx
            .auth_provider()
            .refresh(&request.refresh_token)
            .await
            .inspect_err(|e| warn!(error = %e, "Token refresh failed"))?;

        self.complete(session).await
    }

    /// Revoke the refresh token, if one was given
    #[instrument(skip(self, request))]
    pub async fn sign_out(&self, user_id: Uuid, request: SignOutRequest) -> ServiceResult<()> {
        if let Some(token) = request.refresh_token.as_deref() {
            self.ctx.auth_provider().sign_out(token).await?;
        }
        info!(user_id = %user_id, "User signed out");
        Ok(())
    }

    /// Resolve a bearer access token to its user id
    pub fn authenticate(&self, access_token: &str) -> ServiceResult<Uuid> {
        let claims = self.ctx.jwt_service().validate_access_token(access_token)?;
        Ok(claims.user_id())
    }

    /// The caller's profile, if one exists yet
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self, user_id: Uuid) -> ServiceResult<Option<ProfileResponse>> {
        let profile = self.ctx.profile_repo().find_by_id(user_id).await?;
        Ok(profile.map(ProfileResponse::from))
    }

    /// Create the caller's profile explicitly
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_profile(
        &self,
        user_id: Uuid,
        request: CreateProfileRequest,
    ) -> ServiceResult<ProfileResponse> {
        let profile = Profile::new(user_id, request.username, request.display_name);
        profile.validate()?;

        self.ctx.profile_repo().create(&profile).await?;
        info!(user_id = %user_id, "Profile created");
        self.ctx
            .publish_change(Table::Profiles, ChangeKind::Insert, &profile)
            .await;

        Ok(ProfileResponse::from(&profile))
    }

    /// Profile, invite state and route for the signed-in user
    #[instrument(skip(self))]
    pub async fn current_user(&self, user_id: Uuid) -> ServiceResult<MeResponse> {
        let profile = self
            .ctx
            .profile_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::ProfileNotFound(user_id))?;
        let latest = self.ctx.invite_repo().find_latest_for_user(user_id).await?;

        Ok(MeResponse {
            invite_status: InviteState::from_latest(latest.as_ref()),
            route: AccessRoute::decide(&profile, latest.as_ref()).into(),
            profile: ProfileResponse::from(profile),
        })
    }

    async fn complete(&self, session: AuthSession) -> ServiceResult<SessionResponse> {
        let outcome = BootstrapService::new(self.ctx)
            .bootstrap(&session.identity)
            .await?;
        Ok(session_response(session, outcome))
    }
}

/// Combine provider tokens with the bootstrap result
pub fn session_response(session: AuthSession, outcome: BootstrapOutcome) -> SessionResponse {
    SessionResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: session.expires_in,
        profile: ProfileResponse::from(outcome.profile),
        route: outcome.route.into(),
    }
}
