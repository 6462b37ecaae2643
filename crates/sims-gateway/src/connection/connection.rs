//! Individual WebSocket connection
//!
//! Owned by the socket task. Holds the session, the live feed buffer and
//! pager for whoever identified on this socket.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::StreamExt;
use serde::Serialize;
use sims_core::traits::ChangeStream;
use sims_core::{ChangeEvent, Table};
use sims_service::services::{
    FeedBuffer, FeedPager, ServiceContext, ServiceResult, SessionStore, SessionView,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::events::GatewayEventType;
use crate::protocol::{CloseCode, GatewayMessage};

/// What the send task writes to the socket
#[derive(Debug, Clone)]
pub enum Outbound {
    Message(GatewayMessage),
    Close(CloseCode),
}

/// A change-feed event routed to this connection
#[derive(Debug, Clone)]
pub enum Change {
    Feed(ChangeEvent),
    Profile(ChangeEvent),
}

/// A single WebSocket connection
pub struct Connection {
    session_id: String,
    ctx: Arc<ServiceContext>,
    sender: mpsc::Sender<Outbound>,
    session: SessionStore,
    viewer: SessionView,
    feed: FeedBuffer,
    pager: FeedPager,
    profile_events: Option<ChangeStream>,
    sequence: u64,
    last_heartbeat: Instant,
}

impl Connection {
    pub fn new(session_id: String, ctx: Arc<ServiceContext>, sender: mpsc::Sender<Outbound>) -> Self {
        let feed = FeedBuffer::new(ctx.post_repo_arc(), ctx.change_feed_arc());
        let pager = FeedPager::new(ctx.settings().feed_page_size);
        let session = SessionStore::new();
        let viewer = session.view();
        Self {
            session_id,
            ctx,
            sender,
            session,
            viewer,
            feed,
            pager,
            profile_events: None,
            sequence: 0,
            last_heartbeat: Instant::now(),
        }
    }

    /// Generate a fresh session ID
    pub fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn ctx(&self) -> &Arc<ServiceContext> {
        &self.ctx
    }

    /// Read-only view of the signed-in user
    pub fn session(&self) -> &SessionView {
        &self.viewer
    }

    /// Writer side, for Identify and profile refreshes only
    pub fn session_store(&self) -> &SessionStore {
        &self.session
    }

    pub fn feed(&self) -> &FeedBuffer {
        &self.feed
    }

    pub fn feed_mut(&mut self) -> &mut FeedBuffer {
        &mut self.feed
    }

    pub fn pager(&self) -> &FeedPager {
        &self.pager
    }

    /// The identified user, if any
    pub fn user_id(&self) -> Option<Uuid> {
        self.viewer.user_id()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id().is_some()
    }

    pub fn current_sequence(&self) -> u64 {
        self.sequence
    }

    pub fn record_heartbeat(&mut self) {
        self.last_heartbeat = Instant::now();
    }

    pub fn time_since_heartbeat(&self) -> Duration {
        self.last_heartbeat.elapsed()
    }

    /// Queue a raw message. Returns `false` once the send task is gone.
    pub async fn send(&mut self, message: GatewayMessage) -> bool {
        self.sender.send(Outbound::Message(message)).await.is_ok()
    }

    /// Queue a close frame
    pub async fn close(&mut self, code: CloseCode) -> bool {
        self.sender.send(Outbound::Close(code)).await.is_ok()
    }

    /// Send a dispatch event with the next sequence number
    pub async fn dispatch<T: Serialize>(&mut self, event: GatewayEventType, payload: &T) -> bool {
        let data = match serde_json::to_value(payload) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(event = %event, error = %e, "Failed to serialize event payload");
                return false;
            }
        };
        self.sequence += 1;
        self.send(GatewayMessage::dispatch(event.as_str(), self.sequence, data))
            .await
    }

    /// Start following profile updates. Subscribes once per connection.
    pub async fn watch_profiles(&mut self) -> ServiceResult<()> {
        if self.profile_events.is_none() {
            self.profile_events = Some(self.ctx.change_feed().subscribe(Table::Profiles).await?);
        }
        Ok(())
    }

    /// Wait for the next change relevant to this connection.
    ///
    /// Pends forever before Identify. `None` when the feed subscription ends.
    pub async fn next_change(&mut self) -> Option<Change> {
        loop {
            let profiles = &mut self.profile_events;
            let feed = &mut self.feed;
            tokio::select! {
                event = feed.next_event() => return event.map(Change::Feed),
                event = next_or_pending(profiles) => match event {
                    Some(event) => return Some(Change::Profile(event)),
                    None => self.profile_events = None,
                },
            }
        }
    }
}

async fn next_or_pending(stream: &mut Option<ChangeStream>) -> Option<ChangeEvent> {
    match stream.as_mut() {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("session_id", &self.session_id)
            .field("user_id", &self.user_id())
            .field("sequence", &self.sequence)
            .field("feed", &self.feed)
            .finish()
    }
}
