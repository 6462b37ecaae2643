//! Realtime feed buffer and pager
//!
//! A [`FeedBuffer`] belongs to one viewer. New posts by other users arrive on
//! the change feed and are staged rather than shown, so the list never jumps
//! under the reader; `merge_pending` moves them to the top on request.
//! [`FeedPager`] loads older pages by offset.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use sims_core::entities::{FeedPost, FeedPostView};
use sims_core::traits::{ChangeFeed, ChangeStream, PostRepository};
use sims_core::{ChangeEvent, Table};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::ServiceResult;

/// Live feed state for one viewer
pub struct FeedBuffer {
    posts: Arc<dyn PostRepository>,
    change_feed: Arc<dyn ChangeFeed>,
    viewer_id: Option<Uuid>,
    stream: Option<ChangeStream>,
    displayed: Vec<FeedPostView>,
    staged: Vec<FeedPostView>,
    seen: HashSet<Uuid>,
}

impl FeedBuffer {
    pub fn new(posts: Arc<dyn PostRepository>, change_feed: Arc<dyn ChangeFeed>) -> Self {
        Self {
            posts,
            change_feed,
            viewer_id: None,
            stream: None,
            displayed: Vec::new(),
            staged: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn viewer_id(&self) -> Option<Uuid> {
        self.viewer_id
    }

    /// Follow a new viewer. Any previous subscription is dropped and the
    /// buffer cleared; the same viewer again is a no-op.
    pub async fn set_viewer(&mut self, viewer_id: Option<Uuid>) -> ServiceResult<()> {
        if self.viewer_id == viewer_id && (viewer_id.is_none() || self.stream.is_some()) {
            return Ok(());
        }

        self.stream = None;
        self.displayed.clear();
        self.staged.clear();
        self.seen.clear();
        self.viewer_id = viewer_id;

        if let Some(viewer) = viewer_id {
            self.stream = Some(self.change_feed.subscribe(Table::FeedPosts).await?);
            debug!(viewer_id = %viewer, "Feed buffer subscribed");
        }
        Ok(())
    }

    /// Next raw event from the subscription. Pends forever while there is no viewer.
    pub async fn next_event(&mut self) -> Option<ChangeEvent> {
        match self.stream.as_mut() {
            Some(stream) => stream.next().await,
            None => std::future::pending().await,
        }
    }

    /// Stage an insert if it is new and by someone else. Returns whether it was staged.
    pub async fn handle_event(&mut self, event: &ChangeEvent) -> ServiceResult<bool> {
        let Some(viewer) = self.viewer_id else {
            return Ok(false);
        };
        if !event.is_insert_on(Table::FeedPosts) {
            return Ok(false);
        }

        let post: FeedPost = match event.record_as() {
            Ok(post) => post,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable feed event");
                return Ok(false);
            }
        };
        if post.author_id == viewer || self.seen.contains(&post.id) {
            return Ok(false);
        }

        let Some(view) = self.posts.find_view(post.id, viewer).await? else {
            // Deleted before we could load it
            return Ok(false);
        };
        if !self.seen.insert(view.id()) {
            return Ok(false);
        }
        self.staged.push(view);
        Ok(true)
    }

    /// Wait for the next event and stage it. `None` when the subscription ended.
    pub async fn pump(&mut self) -> Option<ServiceResult<bool>> {
        let event = self.next_event().await?;
        Some(self.handle_event(&event).await)
    }

    pub fn pending_count(&self) -> usize {
        self.staged.len()
    }

    /// Move staged posts above the displayed list, newest first. Returns the merged posts.
    pub fn merge_pending(&mut self) -> Vec<FeedPostView> {
        let merged: Vec<FeedPostView> = self.staged.drain(..).rev().collect();
        let mut displayed = merged.clone();
        displayed.append(&mut self.displayed);
        self.displayed = displayed;
        merged
    }

    /// Append a loaded page below what is displayed, skipping anything already shown
    pub fn extend_displayed(&mut self, page: Vec<FeedPostView>) -> Vec<FeedPostView> {
        let fresh: Vec<FeedPostView> = page
            .into_iter()
            .filter(|view| self.seen.insert(view.id()))
            .collect();
        self.displayed.extend(fresh.iter().cloned());
        fresh
    }

    pub fn displayed(&self) -> &[FeedPostView] {
        &self.displayed
    }
}

impl std::fmt::Debug for FeedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedBuffer")
            .field("viewer_id", &self.viewer_id)
            .field("subscribed", &self.stream.is_some())
            .field("displayed", &self.displayed.len())
            .field("staged", &self.staged.len())
            .finish()
    }
}

/// Result of a `load_more` call
#[derive(Debug)]
pub enum PageLoad {
    Loaded(Vec<FeedPostView>),
    /// Another load is in flight
    Busy,
    /// A previous short page marked the end
    Exhausted,
}

/// Offset pager over the feed
#[derive(Debug)]
pub struct FeedPager {
    page_size: i64,
    offset: AtomicI64,
    has_more: AtomicBool,
    in_flight: AtomicBool,
}

impl FeedPager {
    pub fn new(page_size: i64) -> Self {
        Self {
            page_size: page_size.max(1),
            offset: AtomicI64::new(0),
            has_more: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_more.load(Ordering::Acquire)
    }

    /// Fetch the next page. A concurrent call while one is in flight fetches nothing.
    pub async fn load_more(
        &self,
        posts: &dyn PostRepository,
        viewer_id: Uuid,
    ) -> ServiceResult<PageLoad> {
        if !self.has_more() {
            return Ok(PageLoad::Exhausted);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(PageLoad::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let offset = self.offset.load(Ordering::Acquire);
        let page = posts.list_feed(viewer_id, self.page_size, offset).await?;

        let fetched = i64::try_from(page.len()).unwrap_or(i64::MAX);
        self.offset.fetch_add(fetched, Ordering::AcqRel);
        if fetched < self.page_size {
            self.has_more.store(false, Ordering::Release);
        }
        Ok(PageLoad::Loaded(page))
    }

    /// Start over from the newest post
    pub fn reset(&self) {
        self.offset.store(0, Ordering::Release);
        self.has_more.store(true, Ordering::Release);
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;
    use sims_core::ChangeKind;

    async fn buffer_for(h: &TestHarness, viewer: Uuid) -> FeedBuffer {
        let mut buffer = FeedBuffer::new(h.ctx.post_repo_arc(), h.ctx.change_feed_arc());
        buffer.set_viewer(Some(viewer)).await.unwrap();
        buffer
    }

    #[tokio::test]
    async fn test_stages_others_posts_once() {
        let h = TestHarness::new();
        let viewer = h.profile("viewer").await;
        let author = h.profile("author").await;
        let mut buffer = buffer_for(&h, viewer.id).await;

        let post = h.post(author.id, "hello").await;
        let event = ChangeEvent::insert(Table::FeedPosts, &post).unwrap();

        assert!(buffer.handle_event(&event).await.unwrap());
        assert!(!buffer.handle_event(&event).await.unwrap());
        assert_eq!(buffer.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_ignores_own_posts_and_non_inserts() {
        let h = TestHarness::new();
        let viewer = h.profile("viewer").await;
        let mut buffer = buffer_for(&h, viewer.id).await;

        let own = h.post(viewer.id, "mine").await;
        let event = ChangeEvent::insert(Table::FeedPosts, &own).unwrap();
        assert!(!buffer.handle_event(&event).await.unwrap());

        let other = h.profile("author").await;
        let post = h.post(other.id, "edited").await;
        let update = ChangeEvent::new(Table::FeedPosts, ChangeKind::Update, &post).unwrap();
        assert!(!buffer.handle_event(&update).await.unwrap());

        assert_eq!(buffer.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_skips_posts_already_displayed() {
        let h = TestHarness::new();
        let viewer = h.profile("viewer").await;
        let author = h.profile("author").await;
        let mut buffer = buffer_for(&h, viewer.id).await;

        let post = h.post(author.id, "already here").await;
        let page = h.ctx.post_repo().list_feed(viewer.id, 10, 0).await.unwrap();
        buffer.extend_displayed(page);

        let event = ChangeEvent::insert(Table::FeedPosts, &post).unwrap();
        assert!(!buffer.handle_event(&event).await.unwrap());
    }

    #[tokio::test]
    async fn test_merge_puts_newest_on_top() {
        let h = TestHarness::new();
        let viewer = h.profile("viewer").await;
        let author = h.profile("author").await;
        let mut buffer = buffer_for(&h, viewer.id).await;

        let old = h.post(author.id, "old").await;
        buffer.extend_displayed(h.ctx.post_repo().list_feed(viewer.id, 10, 0).await.unwrap());

        let first = h.post(author.id, "first").await;
        let second = h.post(author.id, "second").await;
        for post in [&first, &second] {
            let event = ChangeEvent::insert(Table::FeedPosts, post).unwrap();
            buffer.handle_event(&event).await.unwrap();
        }

        let merged = buffer.merge_pending();
        assert_eq!(merged.len(), 2);
        assert_eq!(buffer.pending_count(), 0);

        let ids: Vec<Uuid> = buffer.displayed().iter().map(FeedPostView::id).collect();
        assert_eq!(ids, vec![second.id, first.id, old.id]);

        let unique: HashSet<Uuid> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn test_receives_live_inserts() {
        let h = TestHarness::new();
        let viewer = h.profile("viewer").await;
        let author = h.profile("author").await;
        let mut buffer = buffer_for(&h, viewer.id).await;

        let post = h.post(author.id, "live").await;
        h.ctx
            .publish_change(Table::FeedPosts, ChangeKind::Insert, &post)
            .await;

        assert!(buffer.pump().await.unwrap().unwrap());
        assert_eq!(buffer.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_switching_viewer_resets_state() {
        let h = TestHarness::new();
        let viewer = h.profile("viewer").await;
        let other = h.profile("other").await;
        let author = h.profile("author").await;
        let mut buffer = buffer_for(&h, viewer.id).await;

        let post = h.post(author.id, "hello").await;
        let event = ChangeEvent::insert(Table::FeedPosts, &post).unwrap();
        buffer.handle_event(&event).await.unwrap();

        buffer.set_viewer(Some(other.id)).await.unwrap();
        assert_eq!(buffer.pending_count(), 0);
        assert_eq!(buffer.viewer_id(), Some(other.id));

        buffer.set_viewer(None).await.unwrap();
        assert!(!buffer.handle_event(&event).await.unwrap());
    }

    #[tokio::test]
    async fn test_pager_stops_after_short_page() {
        let h = TestHarness::new();
        let viewer = h.profile("viewer").await;
        let author = h.profile("author").await;
        for i in 0..45 {
            h.post(author.id, &format!("post {i}")).await;
        }

        let pager = FeedPager::new(20);
        let mut calls = 0;
        let mut total = 0;
        while pager.has_more() {
            match pager.load_more(h.ctx.post_repo(), viewer.id).await.unwrap() {
                PageLoad::Loaded(page) => total += page.len(),
                other => panic!("unexpected {other:?}"),
            }
            calls += 1;
        }

        assert_eq!(calls, 3);
        assert_eq!(total, 45);
        assert!(matches!(
            pager.load_more(h.ctx.post_repo(), viewer.id).await.unwrap(),
            PageLoad::Exhausted
        ));
    }

    #[tokio::test]
    async fn test_pager_refuses_concurrent_load() {
        let h = TestHarness::new();
        let viewer = h.profile("viewer").await;
        let pager = FeedPager::new(20);

        pager.in_flight.store(true, Ordering::Release);
        assert!(matches!(
            pager.load_more(h.ctx.post_repo(), viewer.id).await.unwrap(),
            PageLoad::Busy
        ));
        assert_eq!(h.posts.list_calls(), 0);
    }
}
