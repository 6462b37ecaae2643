//! Change-feed consumer that drives the dispatcher

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use sims_core::{ChangeEvent, Notification, Table};
use sims_service::services::{ServiceContext, ServiceResult};
use tracing::{debug, info, warn};

use crate::delivery::{DeliveryReport, PushDispatcher};

/// Follows notification inserts until shut down
#[derive(Debug, Clone)]
pub struct PushWorker {
    ctx: Arc<ServiceContext>,
    dispatcher: PushDispatcher,
}

impl PushWorker {
    pub fn new(ctx: Arc<ServiceContext>, dispatcher: PushDispatcher) -> Self {
        Self { ctx, dispatcher }
    }

    /// Process a single change event. `None` for events that are not
    /// notification inserts.
    pub async fn handle_event(&self, event: &ChangeEvent) -> Option<DeliveryReport> {
        if !event.is_insert_on(Table::Notifications) {
            return None;
        }
        let notification: Notification = match event.record_as() {
            Ok(notification) => notification,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable notification event");
                return None;
            }
        };
        debug!(notification_id = %notification.id, "Notification insert received");
        Some(self.dispatcher.deliver(&notification).await)
    }

    /// Run until `shutdown` resolves or the change feed closes
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> ServiceResult<()> {
        let mut events = self
            .ctx
            .change_feed()
            .subscribe(Table::Notifications)
            .await?;
        info!("Push worker subscribed to notifications");

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("Push worker shutting down");
                    break;
                }
                event = events.next() => match event {
                    Some(event) => {
                        self.handle_event(&event).await;
                    }
                    None => {
                        warn!("Notification change stream ended");
                        break;
                    }
                },
            }
        }
        Ok(())
    }
}
