//! In-process change feed

use async_trait::async_trait;
use futures::{stream, StreamExt};
use sims_core::traits::{ChangeFeed, ChangeStream, RepoResult};
use sims_core::{ChangeEvent, Table};
use tokio::sync::broadcast;
use tracing::warn;

const DEFAULT_CAPACITY: usize = 1024;

/// Change feed for a single process, e.g. tests or a one-node deployment
#[derive(Debug, Clone)]
pub struct BroadcastChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl BroadcastChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeFeed for BroadcastChangeFeed {
    async fn publish(&self, event: ChangeEvent) -> RepoResult<()> {
        // No subscribers is not an error
        let _ = self.tx.send(event);
        Ok(())
    }

    async fn subscribe(&self, table: Table) -> RepoResult<ChangeStream> {
        let rx = self.tx.subscribe();
        Ok(stream::unfold(rx, move |mut rx| async move {
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
        .boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sims_core::ChangeKind;

    #[tokio::test]
    async fn test_subscribe_filters_by_table() {
        let feed = BroadcastChangeFeed::new();
        let mut posts = feed.subscribe(Table::FeedPosts).await.unwrap();

        feed.publish(ChangeEvent::new(Table::Profiles, ChangeKind::Update, &"p").unwrap())
            .await
            .unwrap();
        feed.publish(ChangeEvent::insert(Table::FeedPosts, &"f").unwrap())
            .await
            .unwrap();

        let event = posts.next().await.unwrap();
        assert_eq!(event.table, Table::FeedPosts);
        assert_eq!(event.kind, ChangeKind::Insert);
    }

    #[tokio::test]
    async fn test_dropping_stream_unsubscribes() {
        let feed = BroadcastChangeFeed::new();
        let stream = feed.subscribe(Table::Notifications).await.unwrap();
        assert_eq!(feed.subscriber_count(), 1);
        drop(stream);
        assert_eq!(feed.subscriber_count(), 0);
    }
}
