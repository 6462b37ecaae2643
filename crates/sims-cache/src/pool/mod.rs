//! Redis connection pooling.

mod redis_pool;

pub use redis_pool::{RedisPool, RedisPoolError, RedisResult};
