//! Redis Pub/Sub subscriber for change events.
//!
//! One dedicated pub/sub connection per process. Payloads are decoded into
//! [`ChangeEvent`]s as they arrive and fanned out to local receivers through a
//! broadcast channel. On connection loss the listener sleeps, reconnects and
//! resubscribes every table it was following.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use redis::Client;
use sims_core::{ChangeEvent, Table};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{debug, error, info, trace, warn};

use crate::pubsub::PubSubChannel;

#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Subscriber stopped")]
    Stopped,
}

pub type SubscriberResult<T> = Result<T, SubscriberError>;

#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub redis_url: String,
    /// Events buffered per local receiver before it lags
    pub broadcast_buffer: usize,
    pub reconnect_delay: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// Background listener handle. Dropping every handle stops the listener.
pub struct Subscriber {
    following: Arc<RwLock<HashSet<Table>>>,
    events: broadcast::Sender<ChangeEvent>,
    follow_tx: mpsc::Sender<Vec<Table>>,
}

impl Subscriber {
    /// Spawn the listener task. It connects lazily and retries forever.
    pub fn spawn(config: SubscriberConfig) -> Self {
        let (events, _) = broadcast::channel(config.broadcast_buffer);
        let (follow_tx, follow_rx) = mpsc::channel(32);
        let following = Arc::new(RwLock::new(HashSet::new()));

        tokio::spawn(listen_forever(
            config,
            following.clone(),
            events.clone(),
            follow_rx,
        ));

        Self {
            following,
            events,
            follow_tx,
        }
    }

    /// Start following `tables`. Tables already followed are skipped.
    pub async fn follow(&self, tables: &[Table]) -> SubscriberResult<()> {
        let missing: Vec<Table> = {
            let following = self.following.read().await;
            tables
                .iter()
                .copied()
                .filter(|t| !following.contains(t))
                .collect()
        };
        if missing.is_empty() {
            return Ok(());
        }

        self.follow_tx
            .send(missing)
            .await
            .map_err(|_| SubscriberError::Stopped)
    }

    /// Receiver for every decoded event, whatever its table
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}

async fn listen_forever(
    config: SubscriberConfig,
    following: Arc<RwLock<HashSet<Table>>>,
    events: broadcast::Sender<ChangeEvent>,
    mut follow_rx: mpsc::Receiver<Vec<Table>>,
) {
    loop {
        match listen(&config, &following, &events, &mut follow_rx).await {
            Ok(()) => {
                info!("Change subscriber stopped");
                return;
            }
            Err(e) => {
                error!(
                    error = %e,
                    delay_ms = config.reconnect_delay.as_millis(),
                    "Change subscriber lost Redis, reconnecting"
                );
                tokio::time::sleep(config.reconnect_delay).await;
            }
        }
    }
}

/// Run one connection until it fails (`Err`) or the handle is dropped (`Ok`)
async fn listen(
    config: &SubscriberConfig,
    following: &RwLock<HashSet<Table>>,
    events: &broadcast::Sender<ChangeEvent>,
    follow_rx: &mut mpsc::Receiver<Vec<Table>>,
) -> SubscriberResult<()> {
    let client = Client::open(config.redis_url.as_str())?;
    let mut pubsub = client.get_async_pubsub().await?;

    for table in following.read().await.iter() {
        pubsub.subscribe(PubSubChannel::table(*table).name()).await?;
    }
    info!("Change subscriber connected");

    loop {
        let mut messages = pubsub.on_message();
        let requested = loop {
            tokio::select! {
                msg = messages.next() => {
                    let Some(msg) = msg else {
                        warn!("Pub/Sub stream ended");
                        return Err(SubscriberError::Redis(redis::RedisError::from((
                            redis::ErrorKind::IoError,
                            "pub/sub stream ended",
                        ))));
                    };
                    let payload: String = msg.get_payload().unwrap_or_default();
                    if let Some(event) = decode(msg.get_channel_name(), &payload) {
                        // No local receivers is fine
                        let _ = events.send(event);
                    }
                }
                tables = follow_rx.recv() => break tables,
            }
        };
        drop(messages);

        let Some(tables) = requested else {
            return Ok(());
        };
        for table in tables {
            let channel = PubSubChannel::table(table);
            match pubsub.subscribe(channel.name()).await {
                Ok(()) => {
                    following.write().await.insert(table);
                    debug!(%channel, "Following table changes");
                }
                Err(e) => error!(%channel, error = %e, "Failed to subscribe"),
            }
        }
    }
}

/// Decode a payload, dropping foreign channels and events filed under the wrong table
fn decode(channel_name: &str, payload: &str) -> Option<ChangeEvent> {
    let channel = PubSubChannel::parse(channel_name)?;
    match serde_json::from_str::<ChangeEvent>(payload) {
        Ok(event) if event.table == channel.source() => {
            trace!(%channel, kind = ?event.kind, "Change event received");
            Some(event)
        }
        Ok(event) => {
            warn!(%channel, table = %event.table, "Change event on the wrong channel");
            None
        }
        Err(e) => {
            warn!(%channel, error = %e, "Undecodable change event");
            None
        }
    }
}
