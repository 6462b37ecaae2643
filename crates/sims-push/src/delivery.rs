//! Fan a notification out to every device of its recipient

use std::sync::Arc;

use futures::{stream, StreamExt};
use sims_core::{Notification, PushSubscription};
use sims_service::services::ServiceContext;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::message::PushMessage;
use crate::transport::{PushTransport, SendError};

/// One device that did not get the message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryFailure {
    pub endpoint: String,
    pub error: SendError,
}

/// Outcome of delivering one notification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub notification_id: Uuid,
    pub attempted: usize,
    pub delivered: usize,
    pub failures: Vec<DeliveryFailure>,
    /// Endpoints unregistered because the push service said they are gone
    pub pruned: Vec<String>,
}

impl DeliveryReport {
    fn new(notification_id: Uuid) -> Self {
        Self {
            notification_id,
            ..Self::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sends push messages with bounded concurrency
#[derive(Clone)]
pub struct PushDispatcher {
    ctx: Arc<ServiceContext>,
    transport: Arc<dyn PushTransport>,
    concurrency: usize,
}

impl PushDispatcher {
    pub fn new(
        ctx: Arc<ServiceContext>,
        transport: Arc<dyn PushTransport>,
        concurrency: usize,
    ) -> Self {
        Self {
            ctx,
            transport,
            concurrency: concurrency.max(1),
        }
    }

    /// Deliver to every subscription of the recipient. Never fails as a
    /// whole; per-device problems end up in the report.
    #[instrument(skip_all, fields(notification_id = %notification.id, user_id = %notification.user_id))]
    pub async fn deliver(&self, notification: &Notification) -> DeliveryReport {
        let mut report = DeliveryReport::new(notification.id);

        let subscriptions = match self
            .ctx
            .push_subscription_repo()
            .list_for_user(notification.user_id)
            .await
        {
            Ok(subscriptions) => subscriptions,
            Err(e) => {
                warn!(error = %e, "Failed to load push subscriptions");
                return report;
            }
        };
        if subscriptions.is_empty() {
            return report;
        }

        let message = PushMessage::from(notification);
        report.attempted = subscriptions.len();

        let outcomes: Vec<(PushSubscription, Result<(), SendError>)> =
            stream::iter(subscriptions)
                .map(|subscription| {
                    let message = &message;
                    async move {
                        let result = self.transport.send(&subscription, message).await;
                        (subscription, result)
                    }
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        for (subscription, result) in outcomes {
            match result {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    if error.is_gone() {
                        self.prune(&subscription.endpoint, &mut report).await;
                    } else {
                        warn!(
                            subscription_id = %subscription.id,
                            error = %error,
                            "Push delivery failed"
                        );
                    }
                    report.failures.push(DeliveryFailure {
                        endpoint: subscription.endpoint,
                        error,
                    });
                }
            }
        }

        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failures.len(),
            pruned = report.pruned.len(),
            "Push batch finished"
        );
        report
    }

    async fn prune(&self, endpoint: &str, report: &mut DeliveryReport) {
        match self
            .ctx
            .push_subscription_repo()
            .delete_by_endpoint(endpoint)
            .await
        {
            Ok(_) => {
                info!(endpoint = %endpoint, "Pruned gone push endpoint");
                report.pruned.push(endpoint.to_string());
            }
            Err(e) => warn!(endpoint = %endpoint, error = %e, "Failed to prune push endpoint"),
        }
    }
}

impl std::fmt::Debug for PushDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushDispatcher")
            .field("concurrency", &self.concurrency)
            .finish_non_exhaustive()
    }
}
