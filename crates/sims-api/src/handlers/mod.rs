//! Route handlers
//!
//! All HTTP request handlers organized by domain.

pub mod auth;
pub mod friends;
pub mod health;
pub mod invites;
pub mod notifications;
pub mod oauth;
pub mod posts;
pub mod profiles;
pub mod push;
