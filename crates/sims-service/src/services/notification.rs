//! Notification service and the fire-and-forget dispatcher
//!
//! Writers never wait on notifications: the dispatcher spawns each delivery
//! and only logs failures.

use std::sync::Arc;

use sims_core::traits::{ChangeFeed, NotificationRepository, ProfileRepository};
use sims_core::{ChangeEvent, NewNotification, Notification, NotificationType, Table};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::dto::{NotificationQuery, NotificationResponse, PageResponse, UnreadCountResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::mention;

const DEFAULT_LIMIT: i64 = 30;
const MAX_LIMIT: i64 = 100;

/// Writes notifications and announces them on the change feed
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifications: Arc<dyn NotificationRepository>,
    profiles: Arc<dyn ProfileRepository>,
    change_feed: Arc<dyn ChangeFeed>,
}

impl NotificationDispatcher {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        profiles: Arc<dyn ProfileRepository>,
        change_feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            notifications,
            profiles,
            change_feed,
        }
    }

    /// Insert one notification and publish it. Self-notifications are dropped.
    pub async fn deliver(&self, new: NewNotification) -> ServiceResult<Option<Notification>> {
        if new.actor_id == Some(new.user_id) {
            debug!(user_id = %new.user_id, "Skipping self-notification");
            return Ok(None);
        }

        let notification = new.into_notification();
        self.notifications.create(&notification).await?;

        match ChangeEvent::insert(Table::Notifications, &notification) {
            Ok(event) => {
                if let Err(e) = self.change_feed.publish(event).await {
                    warn!(error = %e, notification_id = %notification.id, "Failed to publish notification");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode notification event"),
        }

        Ok(Some(notification))
    }

    /// Deliver in the background. Failures are logged, never surfaced.
    pub fn notify(&self, new: NewNotification) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let recipient = new.user_id;
            let kind = new.notification_type;
            if let Err(e) = this.deliver(new).await {
                warn!(error = %e, user_id = %recipient, kind = %kind, "Notification delivery failed");
            }
        })
    }

    /// Fan out `notification_type` notifications to everyone mentioned in `text`, in the background
    pub fn dispatch_mentions(
        &self,
        text: String,
        actor_id: Uuid,
        notification_type: NotificationType,
        reference_id: Uuid,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let sent = mention::process_mentions(
                &this,
                &text,
                actor_id,
                notification_type,
                reference_id,
            )
            .await;
            debug!(actor_id = %actor_id, sent = sent.len(), "Mention fan-out finished");
        })
    }

    pub(crate) fn profiles(&self) -> &dyn ProfileRepository {
        self.profiles.as_ref()
    }
}

/// Notification inbox operations
pub struct NotificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> NotificationService<'a> {
    /// Create a new NotificationService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Newest first
    #[instrument(skip(self, query), fields(user_id = %user_id))]
    pub async fn list(
        &self,
        user_id: Uuid,
        query: NotificationQuery,
    ) -> ServiceResult<PageResponse<NotificationResponse>> {
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = query.offset.unwrap_or(0).max(0);

        let rows = self
            .ctx
            .notification_repo()
            .list_for_user(user_id, query.unread_only, limit, offset)
            .await?;

        Ok(PageResponse::new(
            rows.iter().map(NotificationResponse::from).collect(),
            offset,
            limit,
        ))
    }

    #[instrument(skip(self))]
    pub async fn unread_count(&self, user_id: Uuid) -> ServiceResult<UnreadCountResponse> {
        let count = self.ctx.notification_repo().unread_count(user_id).await?;
        Ok(UnreadCountResponse { count })
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> ServiceResult<()> {
        let updated = self
            .ctx
            .notification_repo()
            .mark_read(notification_id, user_id)
            .await?;
        if !updated {
            return Err(ServiceError::not_found(
                "Notification",
                notification_id.to_string(),
            ));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, user_id: Uuid) -> ServiceResult<u64> {
        Ok(self.ctx.notification_repo().mark_all_read(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[tokio::test]
    async fn test_self_notification_dropped() {
        let h = TestHarness::new();
        let me = Uuid::new_v4();

        let delivered = h
            .ctx
            .notifier()
            .deliver(NewNotification::new(me, NotificationType::Like).actor(me))
            .await
            .unwrap();

        assert!(delivered.is_none());
        assert!(h.notifications.all().is_empty());
    }

    #[tokio::test]
    async fn test_deliver_publishes_insert() {
        let h = TestHarness::new();
        let mut events = h.ctx.change_feed().subscribe(Table::Notifications).await.unwrap();
        let recipient = Uuid::new_v4();

        h.ctx
            .notifier()
            .deliver(NewNotification::new(recipient, NotificationType::InviteApproved))
            .await
            .unwrap();

        let event = futures::StreamExt::next(&mut events).await.unwrap();
        let n: Notification = event.record_as().unwrap();
        assert_eq!(n.user_id, recipient);
    }

    #[tokio::test]
    async fn test_notify_swallows_failures() {
        let h = TestHarness::new();
        h.notifications.fail_writes(true);

        let handle = h
            .ctx
            .notifier()
            .notify(NewNotification::new(Uuid::new_v4(), NotificationType::Like));

        // The task completes without panicking even though the write failed
        handle.await.unwrap();
        assert!(h.notifications.all().is_empty());
    }

    #[tokio::test]
    async fn test_mark_read_and_count() {
        let h = TestHarness::new();
        let user = Uuid::new_v4();
        let n = h
            .ctx
            .notifier()
            .deliver(NewNotification::new(user, NotificationType::Comment))
            .await
            .unwrap()
            .unwrap();

        let service = NotificationService::new(&h.ctx);
        assert_eq!(service.unread_count(user).await.unwrap().count, 1);

        service.mark_read(user, n.id).await.unwrap();
        assert_eq!(service.unread_count(user).await.unwrap().count, 0);

        let err = service.mark_read(Uuid::new_v4(), n.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
