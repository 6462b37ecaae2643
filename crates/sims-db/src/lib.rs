//! # sims-db
//!
//! Database layer implementing the repository ports with PostgreSQL via SQLx,
//! plus a filesystem-backed object storage for avatars and post images.
//!
//! ## Overview
//!
//! - Connection pool management and schema migrations
//! - Database models with SQLx `FromRow` derives
//! - Model -> entity mappers
//! - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sims_db::pool::{create_pool, run_migrations, DatabaseConfig};
//! use sims_db::repositories::PgProfileRepository;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env();
//!     let pool = create_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     let profiles = PgProfileRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;
pub mod storage;

// Re-export commonly used types
pub use pool::{create_pool, create_pool_from_env, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{
    PgCredentialRepository, PgFriendshipRepository, PgInviteRepository,
    PgNotificationRepository, PgPostRepository, PgProfileRepository,
    PgPushSubscriptionRepository,
};
pub use storage::LocalObjectStorage;
