//! First-login bootstrap
//!
//! Ensures a signed-in identity has a profile and an invite, then decides
//! where the user lands. Safe to run any number of times, concurrently.

use rand::Rng;
use sims_core::entities::{Identity, InviteCode, Profile};
use sims_core::{AccessRoute, ChangeKind, DomainError, Table};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::invite::InviteService;

/// Tagged usernames tried after the plain one is taken
const TAGGED_USERNAME_ATTEMPTS: usize = 5;

/// Result of a bootstrap run
#[derive(Debug, Clone)]
pub struct BootstrapOutcome {
    pub profile: Profile,
    pub latest_invite: Option<InviteCode>,
    pub route: AccessRoute,
}

/// Bootstrap service
pub struct BootstrapService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> BootstrapService<'a> {
    /// Create a new BootstrapService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Ensure profile and invite exist, then route
    #[instrument(skip(self, identity), fields(user_id = %identity.id))]
    pub async fn bootstrap(&self, identity: &Identity) -> ServiceResult<BootstrapOutcome> {
        let profile = match self.fetch_profile(identity.id).await {
            Some(profile) => profile,
            None => self.create_default_profile(identity).await?,
        };

        match InviteService::new(self.ctx)
            .create_invite_for_user(identity.id)
            .await
        {
            Ok(invite) => debug!(invite_id = %invite.id, "Bootstrap created invite"),
            Err(ServiceError::Domain(DomainError::InviteAlreadyExists)) => {}
            Err(e) => warn!(error = %e, "Bootstrap could not create invite"),
        }

        let latest_invite = self
            .ctx
            .invite_repo()
            .find_latest_for_user(identity.id)
            .await?;
        let route = AccessRoute::decide(&profile, latest_invite.as_ref());

        info!(route = route.path(), "Bootstrap complete");
        Ok(BootstrapOutcome {
            profile,
            latest_invite,
            route,
        })
    }

    /// Read failures count as "no profile"; the create below settles it
    async fn fetch_profile(&self, user_id: Uuid) -> Option<Profile> {
        match self.ctx.profile_repo().find_by_id(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(error = %e, "Profile fetch failed during bootstrap");
                None
            }
        }
    }

    async fn create_default_profile(&self, identity: &Identity) -> ServiceResult<Profile> {
        let base = identity.default_username();
        let display_name = identity.default_display_name();
        let is_admin = self
            .ctx
            .settings()
            .onboarding
            .is_admin_email(&identity.email);

        let tagged = (0..TAGGED_USERNAME_ATTEMPTS).map(|_| {
            let tag: u16 = rand::thread_rng().gen_range(0..10_000);
            format!("{base}#{tag:04}")
        });

        for username in std::iter::once(base.clone()).chain(tagged) {
            let mut profile = Profile::new(identity.id, username, display_name.clone());
            profile.is_admin = is_admin;
            profile.avatar_url = identity.metadata.avatar_url.clone();

            match self.ctx.profile_repo().create(&profile).await {
                Ok(()) => {
                    info!(username = %profile.username, is_admin, "Profile created");
                    self.ctx
                        .publish_change(Table::Profiles, ChangeKind::Insert, &profile)
                        .await;
                    return Ok(profile);
                }
                Err(DomainError::ProfileAlreadyExists) => {
                    debug!("Profile created concurrently, re-fetching");
                    return self
                        .ctx
                        .profile_repo()
                        .find_by_id(identity.id)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::internal("profile vanished after create conflict")
                        });
                }
                Err(DomainError::UsernameTaken(name)) => {
                    debug!(username = %name, "Username taken, trying a tagged variant");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ServiceError::conflict(format!(
            "No free username derived from {base}"
        )))
    }
}
