//! Invite service
//!
//! Owns the invite lifecycle (pending, then approved or rejected) and the
//! feed gate derived from a user's latest invite.

use sims_core::entities::{InviteCode, Profile};
use sims_core::{
    generate_invite_code, AccessRoute, ChangeKind, DomainError, InviteState, NewNotification,
    NotificationType, Table,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::dto::{AdminInviteResponse, InviteListQuery, InviteResponse, InviteStatusResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Fresh codes tried before giving up on a collision streak
pub const MAX_CODE_ATTEMPTS: usize = 5;

/// Invite service
pub struct InviteService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> InviteService<'a> {
    /// Create a new InviteService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Create a pending invite owned by `user_id`, regenerating the code on collision.
    ///
    /// Fails with `InviteAlreadyExists` if the user already has an invite.
    #[instrument(skip(self))]
    pub async fn create_invite_for_user(&self, user_id: Uuid) -> ServiceResult<InviteCode> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let invite = InviteCode::new(generate_invite_code(), user_id);

            match self.ctx.invite_repo().create(&invite).await {
                Ok(()) => {
                    info!(invite_id = %invite.id, code = %invite.code, "Invite created");
                    self.ctx
                        .publish_change(Table::InviteCodes, ChangeKind::Insert, &invite)
                        .await;
                    return Ok(invite);
                }
                Err(DomainError::InviteCodeExists) => {
                    debug!(attempt, "Invite code collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(user_id = %user_id, "Exhausted invite code attempts");
        Err(ServiceError::conflict("Could not allocate a unique invite code"))
    }

    /// The caller's latest invite, if any
    #[instrument(skip(self))]
    pub async fn get_my_invite(&self, user_id: Uuid) -> ServiceResult<Option<InviteResponse>> {
        let latest = self.ctx.invite_repo().find_latest_for_user(user_id).await?;
        Ok(latest.as_ref().map(InviteResponse::from))
    }

    /// Coarse status of the caller's latest invite
    #[instrument(skip(self))]
    pub async fn check_invite_status(&self, user_id: Uuid) -> ServiceResult<InviteState> {
        let latest = self.ctx.invite_repo().find_latest_for_user(user_id).await?;
        Ok(InviteState::from_latest(latest.as_ref()))
    }

    /// Approve a pending invite and notify its owner
    #[instrument(skip(self))]
    pub async fn approve_invite(
        &self,
        admin_id: Uuid,
        invite_id: Uuid,
    ) -> ServiceResult<InviteResponse> {
        self.require_admin(admin_id).await?;
        let mut invite = self.load(invite_id).await?;

        invite.approve(admin_id)?;
        self.ctx.invite_repo().update_status(&invite).await?;

        info!(invite_id = %invite.id, user_id = %invite.used_by, "Invite approved");
        self.ctx
            .publish_change(Table::InviteCodes, ChangeKind::Update, &invite)
            .await;
        self.ctx.notifier().notify(
            NewNotification::new(invite.used_by, NotificationType::InviteApproved)
                .actor(admin_id)
                .reference(invite.id),
        );

        Ok(InviteResponse::from(&invite))
    }

    /// Reject a pending invite. Rejection is terminal.
    #[instrument(skip(self))]
    pub async fn reject_invite(
        &self,
        admin_id: Uuid,
        invite_id: Uuid,
    ) -> ServiceResult<InviteResponse> {
        self.require_admin(admin_id).await?;
        let mut invite = self.load(invite_id).await?;

        invite.reject()?;
        self.ctx.invite_repo().update_status(&invite).await?;

        info!(invite_id = %invite.id, user_id = %invite.used_by, "Invite rejected");
        self.ctx
            .publish_change(Table::InviteCodes, ChangeKind::Update, &invite)
            .await;

        Ok(InviteResponse::from(&invite))
    }

    /// Admin queue, newest first
    #[instrument(skip(self, query))]
    pub async fn list_all_invites(
        &self,
        admin_id: Uuid,
        query: InviteListQuery,
    ) -> ServiceResult<Vec<AdminInviteResponse>> {
        self.require_admin(admin_id).await?;
        let rows = self.ctx.invite_repo().list(query.status).await?;
        Ok(rows.iter().map(AdminInviteResponse::from).collect())
    }

    /// Re-read the gate state. On first approval the invite code is recorded
    /// on the profile; later refreshes never overwrite it.
    #[instrument(skip(self))]
    pub async fn refresh_invite_status(&self, user_id: Uuid) -> ServiceResult<InviteStatusResponse> {
        let mut profile = self.load_profile(user_id).await?;
        let latest = self.ctx.invite_repo().find_latest_for_user(user_id).await?;
        let status = InviteState::from_latest(latest.as_ref());

        if let Some(invite) = latest.as_ref() {
            if status == InviteState::Approved && profile.invite_code_used.is_none() {
                let written = self
                    .ctx
                    .profile_repo()
                    .set_invite_code_used_if_empty(user_id, &invite.code)
                    .await?;
                if written {
                    info!(user_id = %user_id, code = %invite.code, "Recorded invite code on profile");
                    profile.invite_code_used = Some(invite.code.clone());
                } else if let Some(current) = self.ctx.profile_repo().find_by_id(user_id).await? {
                    profile = current;
                }
            }
        }

        Ok(InviteStatusResponse {
            status,
            invite_code_used: profile.invite_code_used.clone(),
            route: AccessRoute::decide(&profile, latest.as_ref()).into(),
        })
    }

    /// The feed gate: admins pass, others need an approved latest invite
    #[instrument(skip(self))]
    pub async fn require_feed_access(&self, user_id: Uuid) -> ServiceResult<Profile> {
        let profile = self.load_profile(user_id).await?;
        if profile.is_admin {
            return Ok(profile);
        }

        let latest = self.ctx.invite_repo().find_latest_for_user(user_id).await?;
        if sims_core::can_access_feed(&profile, latest.as_ref()) {
            Ok(profile)
        } else {
            Err(ServiceError::InvitePending {
                status: InviteState::from_latest(latest.as_ref()),
            })
        }
    }

    /// Load the caller's profile and require the admin flag
    #[instrument(skip(self))]
    pub async fn require_admin(&self, user_id: Uuid) -> ServiceResult<Profile> {
        let profile = self.load_profile(user_id).await?;
        if !profile.is_admin {
            warn!(user_id = %user_id, "Admin action refused");
            return Err(DomainError::NotAdmin.into());
        }
        Ok(profile)
    }

    async fn load(&self, invite_id: Uuid) -> ServiceResult<InviteCode> {
        self.ctx
            .invite_repo()
            .find_by_id(invite_id)
            .await?
            .ok_or_else(|| DomainError::InviteNotFound(invite_id).into())
    }

    async fn load_profile(&self, user_id: Uuid) -> ServiceResult<Profile> {
        self.ctx
            .profile_repo()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::ProfileNotFound(user_id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use sims_core::{is_valid_invite_format, InviteStatus};

    #[tokio::test]
    async fn test_create_invite_format_and_pending() {
        let h = TestHarness::new();
        let user = h.profile("bella").await;

        let invite = InviteService::new(&h.ctx)
            .create_invite_for_user(user.id)
            .await
            .unwrap();

        assert!(is_valid_invite_format(&invite.code));
        assert_eq!(invite.status, InviteStatus::Pending);
        assert_eq!(invite.used_by, user.id);
    }

    #[tokio::test]
    async fn test_create_invite_retries_collisions() {
        let h = TestHarness::new();
        let user = h.profile("bella").await;
        h.invites.force_collisions(MAX_CODE_ATTEMPTS - 1);

        let invite = InviteService::new(&h.ctx)
            .create_invite_for_user(user.id)
            .await
            .unwrap();
        assert!(is_valid_invite_format(&invite.code));
    }

    #[tokio::test]
    async fn test_create_invite_gives_up_after_max_attempts() {
        let h = TestHarness::new();
        let user = h.profile("bella").await;
        h.invites.force_collisions(MAX_CODE_ATTEMPTS);

        let err = InviteService::new(&h.ctx)
            .create_invite_for_user(user.id)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
        assert!(h.invites.all().is_empty());
    }

    #[tokio::test]
    async fn test_second_invite_for_user_conflicts() {
        let h = TestHarness::new();
        let user = h.profile("bella").await;
        let service = InviteService::new(&h.ctx);

        service.create_invite_for_user(user.id).await.unwrap();
        let err = service.create_invite_for_user(user.id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::InviteAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_approval_opens_gate_and_notifies() {
        let h = TestHarness::new();
        let admin = h.admin("judith").await;
        let user = h.profile("bella").await;
        let service = InviteService::new(&h.ctx);

        let invite = service.create_invite_for_user(user.id).await.unwrap();
        assert!(matches!(
            service.require_feed_access(user.id).await,
            Err(ServiceError::InvitePending {
                status: InviteState::Pending
            })
        ));

        let approved = service.approve_invite(admin.id, invite.id).await.unwrap();
        assert_eq!(approved.status, InviteStatus::Approved);
        assert_eq!(approved.approved_by, Some(admin.id));
        assert!(approved.approved_at.is_some());

        assert!(service.require_feed_access(user.id).await.is_ok());

        h.wait_for_notifications(user.id, 1).await;
        let inbox = h.notifications.for_user(user.id);
        assert_eq!(inbox[0].notification_type, NotificationType::InviteApproved);
        assert_eq!(inbox[0].reference_id, Some(invite.id));
    }

    #[tokio::test]
    async fn test_non_admin_cannot_approve() {
        let h = TestHarness::new();
        let user = h.profile("bella").await;
        let other = h.profile("mortimer").await;
        let service = InviteService::new(&h.ctx);
        let invite = service.create_invite_for_user(user.id).await.unwrap();

        let err = service.approve_invite(other.id, invite.id).await.unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn test_rejection_is_terminal() {
        let h = TestHarness::new();
        let admin = h.admin("judith").await;
        let user = h.profile("bella").await;
        let service = InviteService::new(&h.ctx);
        let invite = service.create_invite_for_user(user.id).await.unwrap();

        service.reject_invite(admin.id, invite.id).await.unwrap();
        let err = service.approve_invite(admin.id, invite.id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Domain(DomainError::InvalidInviteTransition { .. })
        ));
        assert_eq!(
            service.check_invite_status(user.id).await.unwrap(),
            InviteState::Rejected
        );
    }

    #[tokio::test]
    async fn test_refresh_records_code_once() {
        let h = TestHarness::new();
        let admin = h.admin("judith").await;
        let user = h.profile("bella").await;
        let service = InviteService::new(&h.ctx);
        let invite = service.create_invite_for_user(user.id).await.unwrap();

        let before = service.refresh_invite_status(user.id).await.unwrap();
        assert_eq!(before.status, InviteState::Pending);
        assert_eq!(before.invite_code_used, None);

        service.approve_invite(admin.id, invite.id).await.unwrap();
        let after = service.refresh_invite_status(user.id).await.unwrap();
        assert_eq!(after.status, InviteState::Approved);
        assert_eq!(after.invite_code_used.as_deref(), Some(invite.code.as_str()));
        assert_eq!(after.route.name, AccessRoute::Feed);

        // A second refresh leaves the recorded code untouched
        h.profiles.set_invite_code_used(user.id, "SIMS-AAAA-AAAA");
        let again = service.refresh_invite_status(user.id).await.unwrap();
        assert_eq!(again.invite_code_used.as_deref(), Some("SIMS-AAAA-AAAA"));
    }

    #[tokio::test]
    async fn test_admin_bypasses_gate_without_invite() {
        let h = TestHarness::new();
        let admin = h.admin("judith").await;
        let profile = InviteService::new(&h.ctx)
            .require_feed_access(admin.id)
            .await
            .unwrap();
        assert!(profile.is_admin);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let h = TestHarness::new();
        let admin = h.admin("judith").await;
        let a = h.profile("bella").await;
        let b = h.profile("mortimer").await;
        let service = InviteService::new(&h.ctx);

        let first = service.create_invite_for_user(a.id).await.unwrap();
        service.create_invite_for_user(b.id).await.unwrap();
        service.approve_invite(admin.id, first.id).await.unwrap();

        let pending = service
            .list_all_invites(
                admin.id,
                InviteListQuery {
                    status: Some(InviteStatus::Pending),
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].used_by, b.id);
        assert_eq!(pending[0].username.as_deref(), Some("mortimer"));

        let all = service
            .list_all_invites(admin.id, InviteListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }
}
