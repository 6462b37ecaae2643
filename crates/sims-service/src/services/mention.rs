//! Mention fan-out
//!
//! Resolves `@username` mentions in new posts and comments to profiles and
//! writes one notification of the caller's type per distinct recipient.

use sims_core::{extract_mentions, NewNotification, Notification, NotificationType};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::notification::NotificationDispatcher;

/// Notify everyone mentioned in `text`, except the author.
///
/// Never fails: resolution or write errors are logged and the affected
/// recipients skipped. Returns the notifications that were written.
#[instrument(
    skip(dispatcher, text),
    fields(actor_id = %actor_id, kind = %notification_type, reference_id = %reference_id)
)]
pub async fn process_mentions(
    dispatcher: &NotificationDispatcher,
    text: &str,
    actor_id: Uuid,
    notification_type: NotificationType,
    reference_id: Uuid,
) -> Vec<Notification> {
    let usernames = extract_mentions(text);
    if usernames.is_empty() {
        return Vec::new();
    }

    let resolved = match dispatcher.profiles().resolve_usernames(&usernames).await {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, "Failed to resolve mentioned usernames");
            return Vec::new();
        }
    };

    let mut sent = Vec::new();
    for username in &usernames {
        let Some(&recipient) = resolved.get(username) else {
            continue;
        };
        if recipient == actor_id {
            continue;
        }

        let new = NewNotification::new(recipient, notification_type)
            .actor(actor_id)
            .preview(text)
            .reference(reference_id);

        match dispatcher.deliver(new).await {
            Ok(Some(notification)) => sent.push(notification),
            Ok(None) => {}
            Err(e) => warn!(error = %e, recipient = %recipient, "Failed to write mention notification"),
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    #[tokio::test]
    async fn test_notifies_each_mentioned_user_once() {
        let h = TestHarness::new();
        let author = h.profile("author").await;
        let alice = h.profile("alice").await;
        let bob = h.profile("bob").await;

        let text = "@alice hello @bob @author and @alice again @ghost";
        let post_id = Uuid::new_v4();
        let sent = process_mentions(h.ctx.notifier(), text, author.id, NotificationType::Mention, post_id).await;

        let mut recipients: Vec<Uuid> = sent.iter().map(|n| n.user_id).collect();
        recipients.sort();
        let mut expected = vec![alice.id, bob.id];
        expected.sort();
        assert_eq!(recipients, expected);

        for n in &sent {
            assert_eq!(n.notification_type, NotificationType::Mention);
            assert_eq!(n.actor_id, Some(author.id));
            assert_eq!(n.reference_id, Some(post_id));
            assert_eq!(n.content.as_deref(), Some(text));
        }
    }

    #[tokio::test]
    async fn test_preview_truncated() {
        let h = TestHarness::new();
        let author = h.profile("author").await;
        h.profile("alice").await;

        let text = format!("@alice {}", "x".repeat(300));
        let sent = process_mentions(
            h.ctx.notifier(),
            &text,
            author.id,
            NotificationType::Mention,
            Uuid::new_v4(),
        )
        .await;

        assert_eq!(sent.len(), 1);
        let preview = sent[0].content.as_deref().unwrap();
        assert!(preview.chars().count() <= 100);
    }

    #[tokio::test]
    async fn test_write_failures_are_swallowed() {
        let h = TestHarness::new();
        let author = h.profile("author").await;
        h.profile("alice").await;
        h.notifications.fail_writes(true);

        let sent = process_mentions(
            h.ctx.notifier(),
            "@alice",
            author.id,
            NotificationType::Mention,
            Uuid::new_v4(),
        )
        .await;
        assert!(sent.is_empty());
    }

    #[tokio::test]
    async fn test_no_mentions_no_lookups() {
        let h = TestHarness::new();
        let sent = process_mentions(
            h.ctx.notifier(),
            "plain text",
            Uuid::new_v4(),
            NotificationType::Mention,
            Uuid::new_v4(),
        )
        .await;
        assert!(sent.is_empty());
    }

    #[tokio::test]
    async fn test_uses_the_requested_type() {
        let h = TestHarness::new();
        let author = h.profile("author").await;
        let alice = h.profile("alice").await;
        let comment_id = Uuid::new_v4();

        let sent = process_mentions(
            h.ctx.notifier(),
            "nice one @alice",
            author.id,
            NotificationType::Comment,
            comment_id,
        )
        .await;

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].user_id, alice.id);
        assert_eq!(sent[0].notification_type, NotificationType::Comment);
        assert_eq!(sent[0].reference_id, Some(comment_id));
    }
}
