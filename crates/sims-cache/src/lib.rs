//! # sims-cache
//!
//! Redis layer for cross-process change notification and refresh tokens.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Pub/Sub**: One channel per table, fed by a reconnecting subscriber
//! - **Change Feed**: [`RedisChangeFeed`] implements the `ChangeFeed` port
//! - **Refresh Tokens**: Revocable refresh tokens with TTL
//!
//! ## Example
//!
//! ```ignore
//! use sims_cache::{RedisChangeFeed, RedisPool};
//! use sims_core::{ChangeFeed, Table};
//!
//! let pool = RedisPool::from_config(&config.redis)?;
//! let feed = RedisChangeFeed::connect(pool);
//! let mut posts = feed.subscribe(Table::FeedPosts).await?;
//! ```

pub mod feed;
pub mod pool;
pub mod pubsub;
pub mod session;

pub use pool::{RedisPool, RedisPoolError, RedisResult};

pub use pubsub::{
    PubSubChannel, Publisher, Subscriber, SubscriberConfig, SubscriberError, SubscriberResult,
};

pub use feed::RedisChangeFeed;
pub use session::{RefreshTokenData, RefreshTokenStore};
