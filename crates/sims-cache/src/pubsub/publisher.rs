//! Redis Pub/Sub publisher.

use redis::AsyncCommands;
use serde::Serialize;

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish a JSON payload to a channel. Returns the receiver count.
    pub async fn publish<T: Serialize>(
        &self,
        channel: PubSubChannel,
        payload: &T,
    ) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();
        let payload = serde_json::to_string(payload)?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }
}
