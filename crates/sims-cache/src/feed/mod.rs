//! Change feed adapters

mod redis_change_feed;

pub use redis_change_feed::{change_stream, RedisChangeFeed};
