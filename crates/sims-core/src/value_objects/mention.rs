//! `@username` extraction for notification fan-out

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// `#` is part of the charset so tagged usernames (`name#1234`) match whole
pub(crate) static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([A-Za-z0-9_#]+)").expect("valid regex"));

/// Unique mentioned usernames, in order of first appearance, without the `@`
pub fn extract_mentions(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| seen.insert(*name))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_unique_in_order() {
        let names = extract_mentions("@alice hello @bob @myself and @alice again");
        assert_eq!(names, vec!["alice", "bob", "myself"]);
    }

    #[test]
    fn test_tagged_usernames() {
        assert_eq!(extract_mentions("hey @bella#0042!"), vec!["bella#0042"]);
    }

    #[test]
    fn test_no_mentions() {
        assert!(extract_mentions("no one here @ all").is_empty());
        assert!(extract_mentions("").is_empty());
    }

    #[test]
    fn test_stops_at_non_charset() {
        assert_eq!(extract_mentions("(@bob), @carol."), vec!["bob", "carol"]);
    }
}
