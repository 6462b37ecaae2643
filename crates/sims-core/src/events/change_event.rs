//! Row-level change events carried by the change feed
//!
//! These events are used for:
//! - Realtime feed delivery to connected viewers
//! - Triggering push delivery on notification inserts

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Collections that publish changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    InviteCodes,
    FeedPosts,
    PostComments,
    Notifications,
    Friendships,
    PushSubscriptions,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::InviteCodes => "invite_codes",
            Self::FeedPosts => "feed_posts",
            Self::PostComments => "post_comments",
            Self::Notifications => "notifications",
            Self::Friendships => "friendships",
            Self::PushSubscriptions => "push_subscriptions",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profiles" => Ok(Self::Profiles),
            "invite_codes" => Ok(Self::InviteCodes),
            "feed_posts" => Ok(Self::FeedPosts),
            "post_comments" => Ok(Self::PostComments),
            "notifications" => Ok(Self::Notifications),
            "friendships" => Ok(Self::Friendships),
            "push_subscriptions" => Ok(Self::PushSubscriptions),
            other => Err(DomainError::ValidationError(format!("unknown table: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A single row change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub record: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new<T: Serialize>(
        table: Table,
        kind: ChangeKind,
        record: &T,
    ) -> Result<Self, DomainError> {
        let record = serde_json::to_value(record)
            .map_err(|e| DomainError::InternalError(format!("serialize {table} record: {e}")))?;
        Ok(Self {
            table,
            kind,
            record,
            timestamp: Utc::now(),
        })
    }

    pub fn insert<T: Serialize>(table: Table, record: &T) -> Result<Self, DomainError> {
        Self::new(table, ChangeKind::Insert, record)
    }

    /// Decode the row payload
    pub fn record_as<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(self.record.clone()).map_err(|e| {
            DomainError::InternalError(format!("decode {} record: {e}", self.table))
        })
    }

    #[inline]
    pub fn is_insert_on(&self, table: Table) -> bool {
        self.table == table && self.kind == ChangeKind::Insert
    }
}
