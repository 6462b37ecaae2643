//! Friendship service
//!
//! Requests are directed; once accepted the relation is symmetric. Declining
//! or removing deletes the row so either side may ask again later.

use sims_core::entities::{Friendship, FriendshipStatus};
use sims_core::{
    ChangeKind, DomainError, FriendshipRecordStatus, NewNotification, NotificationType, Table,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dto::{AuthorResponse, FriendResponse, FriendshipResponse};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Friendship service
pub struct FriendshipService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> FriendshipService<'a> {
    /// Create a new FriendshipService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self), fields(requester_id = %requester_id, addressee_id = %addressee_id))]
    pub async fn send_request(
        &self,
        requester_id: Uuid,
        addressee_id: Uuid,
    ) -> ServiceResult<FriendshipResponse> {
        if requester_id == addressee_id {
            return Err(DomainError::CannotFriendSelf.into());
        }

        self.ctx
            .profile_repo()
            .find_by_id(addressee_id)
            .await?
            .ok_or(DomainError::ProfileNotFound(addressee_id))?;

        if self
            .ctx
            .friendship_repo()
            .find_between(requester_id, addressee_id)
            .await?
            .is_some()
        {
            return Err(DomainError::FriendshipExists.into());
        }

        let friendship = Friendship::request(requester_id, addressee_id);
        self.ctx.friendship_repo().create(&friendship).await?;
        info!(friendship_id = %friendship.id, "Friend request sent");

        self.ctx
            .publish_change(Table::Friendships, ChangeKind::Insert, &friendship)
            .await;
        self.ctx.notifier().notify(
            NewNotification::new(addressee_id, NotificationType::FriendRequest)
                .actor(requester_id)
                .reference(friendship.id),
        );

        Ok(FriendshipResponse::for_viewer(&friendship, requester_id))
    }

    /// Only the addressee may accept
    #[instrument(skip(self))]
    pub async fn accept_request(
        &self,
        user_id: Uuid,
        friendship_id: Uuid,
    ) -> ServiceResult<FriendshipResponse> {
        let mut friendship = self.pending_for_addressee(user_id, friendship_id).await?;

        self.ctx.friendship_repo().accept(friendship.id).await?;
        friendship.status = FriendshipRecordStatus::Accepted;
        info!(friendship_id = %friendship.id, "Friend request accepted");

        self.ctx
            .publish_change(Table::Friendships, ChangeKind::Update, &friendship)
            .await;
        self.ctx.notifier().notify(
            NewNotification::new(friendship.requester_id, NotificationType::FriendAccepted)
                .actor(user_id)
                .reference(friendship.id),
        );

        Ok(FriendshipResponse::for_viewer(&friendship, user_id))
    }

    /// Only the addressee may decline
    #[instrument(skip(self))]
    pub async fn decline_request(&self, user_id: Uuid, friendship_id: Uuid) -> ServiceResult<()> {
        let friendship = self.pending_for_addressee(user_id, friendship_id).await?;
        self.delete(friendship).await
    }

    /// Unfriend, or withdraw a request either side made
    #[instrument(skip(self))]
    pub async fn remove_friend(&self, user_id: Uuid, friendship_id: Uuid) -> ServiceResult<()> {
        let friendship = self
            .ctx
            .friendship_repo()
            .find_by_id(friendship_id)
            .await?
            .filter(|f| f.involves(user_id))
            .ok_or(DomainError::FriendshipNotFound)?;
        self.delete(friendship).await
    }

    pub async fn status_with(
        &self,
        viewer_id: Uuid,
        other_id: Uuid,
    ) -> ServiceResult<FriendshipStatus> {
        if viewer_id == other_id {
            return Ok(FriendshipStatus::None);
        }
        let friendship = self
            .ctx
            .friendship_repo()
            .find_between(viewer_id, other_id)
            .await?;
        Ok(friendship
            .map(|f| f.status_for(viewer_id))
            .unwrap_or(FriendshipStatus::None))
    }

    #[instrument(skip(self))]
    pub async fn list_friends(&self, user_id: Uuid) -> ServiceResult<Vec<FriendResponse>> {
        let friendships = self.ctx.friendship_repo().list_accepted(user_id).await?;
        self.with_profiles(user_id, friendships).await
    }

    /// Requests waiting on `user_id`
    #[instrument(skip(self))]
    pub async fn list_incoming(&self, user_id: Uuid) -> ServiceResult<Vec<FriendResponse>> {
        let friendships = self.ctx.friendship_repo().list_incoming(user_id).await?;
        self.with_profiles(user_id, friendships).await
    }

    async fn pending_for_addressee(
        &self,
        user_id: Uuid,
        friendship_id: Uuid,
    ) -> ServiceResult<Friendship> {
        let friendship = self
            .ctx
            .friendship_repo()
            .find_by_id(friendship_id)
            .await?
            .filter(|f| f.status == FriendshipRecordStatus::Pending)
            .ok_or(DomainError::FriendshipNotFound)?;

        if friendship.addressee_id != user_id {
            return Err(DomainError::NotRequestRecipient.into());
        }
        Ok(friendship)
    }

    async fn delete(&self, friendship: Friendship) -> ServiceResult<()> {
        self.ctx.friendship_repo().delete(friendship.id).await?;
        info!(friendship_id = %friendship.id, "Friendship removed");
        self.ctx
            .publish_change(Table::Friendships, ChangeKind::Delete, &friendship)
            .await;
        Ok(())
    }

    async fn with_profiles(
        &self,
        viewer_id: Uuid,
        friendships: Vec<Friendship>,
    ) -> ServiceResult<Vec<FriendResponse>> {
        let mut out = Vec::with_capacity(friendships.len());
        for friendship in friendships {
            let other = friendship.other_party(viewer_id);
            // A party whose profile is gone is left out rather than failing the list
            let Some(profile) = self.ctx.profile_repo().find_by_id(other).await? else {
                continue;
            };
            out.push(FriendResponse {
                friendship_id: friendship.id,
                status: friendship.status_for(viewer_id),
                user: AuthorResponse::from(&profile),
                since: friendship.created_at,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[tokio::test]
    async fn test_request_accept_flow() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let mortimer = h.profile("mortimer").await;
        let service = FriendshipService::new(&h.ctx);

        let sent = service.send_request(bella.id, mortimer.id).await.unwrap();
        assert_eq!(sent.status, FriendshipStatus::PendingSent);
        assert_eq!(
            service.status_with(mortimer.id, bella.id).await.unwrap(),
            FriendshipStatus::PendingReceived
        );

        h.wait_for_notifications(mortimer.id, 1).await;
        assert_eq!(
            h.notifications.for_user(mortimer.id)[0].notification_type,
            NotificationType::FriendRequest
        );

        let incoming = service.list_incoming(mortimer.id).await.unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].user.username, "bella");

        let accepted = service.accept_request(mortimer.id, sent.id).await.unwrap();
        assert_eq!(accepted.status, FriendshipStatus::Accepted);

        h.wait_for_notifications(bella.id, 1).await;
        assert_eq!(
            h.notifications.for_user(bella.id)[0].notification_type,
            NotificationType::FriendAccepted
        );

        let friends = service.list_friends(bella.id).await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].user.id, mortimer.id);
    }

    #[tokio::test]
    async fn test_cannot_friend_self_or_duplicate() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let mortimer = h.profile("mortimer").await;
        let service = FriendshipService::new(&h.ctx);

        let err = service.send_request(bella.id, bella.id).await.unwrap_err();
        assert_eq!(err.error_code(), "CANNOT_FRIEND_SELF");

        service.send_request(bella.id, mortimer.id).await.unwrap();
        let err = service.send_request(mortimer.id, bella.id).await.unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_only_addressee_accepts() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let mortimer = h.profile("mortimer").await;
        let service = FriendshipService::new(&h.ctx);

        let sent = service.send_request(bella.id, mortimer.id).await.unwrap();
        let err = service.accept_request(bella.id, sent.id).await.unwrap_err();
        assert_eq!(err.error_code(), "NOT_REQUEST_RECIPIENT");
    }

    #[tokio::test]
    async fn test_decline_allows_new_request() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let mortimer = h.profile("mortimer").await;
        let service = FriendshipService::new(&h.ctx);

        let sent = service.send_request(bella.id, mortimer.id).await.unwrap();
        service.decline_request(mortimer.id, sent.id).await.unwrap();
        assert_eq!(
            service.status_with(bella.id, mortimer.id).await.unwrap(),
            FriendshipStatus::None
        );

        service.send_request(mortimer.id, bella.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_requires_party() {
        let h = TestHarness::new();
        let bella = h.profile("bella").await;
        let mortimer = h.profile("mortimer").await;
        let stranger = h.profile("nina").await;
        let service = FriendshipService::new(&h.ctx);

        let sent = service.send_request(bella.id, mortimer.id).await.unwrap();
        let err = service.remove_friend(stranger.id, sent.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        service.remove_friend(bella.id, sent.id).await.unwrap();
        assert!(service.list_incoming(mortimer.id).await.unwrap().is_empty());
    }
}
