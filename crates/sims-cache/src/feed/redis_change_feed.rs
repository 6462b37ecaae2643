//! `ChangeFeed` over Redis pub/sub, one channel per table

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::broadcast;
use tracing::{instrument, warn};

use sims_core::error::DomainError;
use sims_core::events::{ChangeEvent, Table};
use sims_core::traits::{ChangeFeed, ChangeStream, RepoResult};

use crate::pool::RedisPool;
use crate::pubsub::{PubSubChannel, Publisher, Subscriber, SubscriberConfig};

/// Change feed shared by every process attached to the same Redis
#[derive(Clone)]
pub struct RedisChangeFeed {
    publisher: Publisher,
    subscriber: Arc<Subscriber>,
}

impl std::fmt::Debug for RedisChangeFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisChangeFeed").finish_non_exhaustive()
    }
}

impl RedisChangeFeed {
    /// Start the background subscriber and wrap the pool for publishing
    pub fn connect(pool: RedisPool) -> Self {
        let subscriber = Subscriber::spawn(SubscriberConfig {
            redis_url: pool.url().to_string(),
            ..SubscriberConfig::default()
        });

        Self {
            publisher: Publisher::new(pool),
            subscriber: Arc::new(subscriber),
        }
    }
}

/// Turn a broadcast receiver into a stream of one table's events.
/// Lagged receivers skip ahead; a closed channel ends the stream.
pub fn change_stream(rx: broadcast::Receiver<ChangeEvent>, table: Table) -> ChangeStream {
    stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) if event.table == table => return Some((event, rx)),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(table = %table, skipped, "Change stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}

#[async_trait]
impl ChangeFeed for RedisChangeFeed {
    #[instrument(skip(self, event), fields(table = %event.table))]
    async fn publish(&self, event: ChangeEvent) -> RepoResult<()> {
        self.publisher
            .publish(PubSubChannel::table(event.table), &event)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn subscribe(&self, table: Table) -> RepoResult<ChangeStream> {
        // Take the receiver first so nothing published after SUBSCRIBE is missed
        let rx = self.subscriber.receiver();
        self.subscriber
            .follow(&[table])
            .await
            .map_err(|e| DomainError::CacheError(e.to_string()))?;

        Ok(change_stream(rx, table))
    }
}
