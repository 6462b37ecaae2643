//! Push subscription service
//!
//! Devices register their browser push endpoint; one row per endpoint.

use sims_core::entities::PushSubscription;
use sims_core::{ChangeKind, DomainError, Table};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dto::{PushSubscriptionRequest, PushSubscriptionResponse};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Push subscription service
pub struct PushSubscriptionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PushSubscriptionService<'a> {
    /// Create a new PushSubscriptionService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register, or re-register, an endpoint for `user_id`
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn register(
        &self,
        user_id: Uuid,
        request: PushSubscriptionRequest,
    ) -> ServiceResult<PushSubscriptionResponse> {
        let subscription = PushSubscription::new(
            user_id,
            request.endpoint,
            request.keys.p256dh,
            request.keys.auth,
        );
        self.ctx
            .push_subscription_repo()
            .upsert(&subscription)
            .await?;
        info!("Push subscription registered");

        self.ctx
            .publish_change(Table::PushSubscriptions, ChangeKind::Insert, &subscription)
            .await;

        Ok(PushSubscriptionResponse::from(&subscription))
    }

    #[instrument(skip(self, endpoint), fields(user_id = %user_id))]
    pub async fn unregister(&self, user_id: Uuid, endpoint: &str) -> ServiceResult<()> {
        let owned = self
            .ctx
            .push_subscription_repo()
            .list_for_user(user_id)
            .await?
            .into_iter()
            .any(|s| s.endpoint == endpoint);
        if !owned {
            return Err(DomainError::SubscriptionNotFound.into());
        }

        self.ctx
            .push_subscription_repo()
            .delete_by_endpoint(endpoint)
            .await?;
        info!("Push subscription removed");
        Ok(())
    }

    pub async fn list(&self, user_id: Uuid) -> ServiceResult<Vec<PushSubscriptionResponse>> {
        let subscriptions = self
            .ctx
            .push_subscription_repo()
            .list_for_user(user_id)
            .await?;
        Ok(subscriptions
            .iter()
            .map(PushSubscriptionResponse::from)
            .collect())
    }
}
