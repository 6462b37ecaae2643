//! Pub/Sub channel naming. Every table gets its own `changes:<table>` channel.

use sims_core::Table;

/// Channel prefix for per-table change events
pub const CHANGES_CHANNEL_PREFIX: &str = "changes:";

/// Channel carrying the row changes of one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PubSubChannel(Table);

impl PubSubChannel {
    #[must_use]
    pub fn table(table: Table) -> Self {
        Self(table)
    }

    /// Table whose changes travel on this channel
    #[must_use]
    pub fn source(self) -> Table {
        self.0
    }

    /// Redis channel name
    #[must_use]
    pub fn name(self) -> String {
        format!("{CHANGES_CHANNEL_PREFIX}{}", self.0)
    }

    /// Recover the channel from a Redis channel name. Foreign channels yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        name.strip_prefix(CHANGES_CHANNEL_PREFIX)
            .and_then(|t| t.parse::<Table>().ok())
            .map(Self)
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{CHANGES_CHANNEL_PREFIX}{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(
            PubSubChannel::table(Table::FeedPosts).name(),
            "changes:feed_posts"
        );
        assert_eq!(
            PubSubChannel::table(Table::Notifications).to_string(),
            "changes:notifications"
        );
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!(
            PubSubChannel::parse("changes:notifications").map(PubSubChannel::source),
            Some(Table::Notifications)
        );
        assert_eq!(PubSubChannel::parse("changes:unknown"), None);
        assert_eq!(PubSubChannel::parse("other"), None);
    }
}
