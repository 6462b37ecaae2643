//! Redis Pub/Sub for cross-process change events.

mod channels;
mod publisher;
mod subscriber;

pub use channels::{PubSubChannel, CHANGES_CHANNEL_PREFIX};
pub use publisher::Publisher;
pub use subscriber::{Subscriber, SubscriberConfig, SubscriberError, SubscriberResult};
