//! Feed handlers (op 3 MergePending, op 4 LoadMore)

use super::{HandlerError, HandlerResult};
use crate::connection::Connection;
use crate::events::{GatewayEventType, PageEvent, PostsMergedEvent};
use sims_service::dto::PostResponse;
use sims_service::services::PageLoad;

/// Handles client feed requests
pub struct FeedHandler;

impl FeedHandler {
    /// Move staged posts to the top of the list
    pub async fn merge_pending(connection: &mut Connection) -> HandlerResult<()> {
        connection.user_id().ok_or(HandlerError::NotAuthenticated)?;

        let merged = connection.feed_mut().merge_pending();
        tracing::debug!(
            session_id = %connection.session_id(),
            merged = merged.len(),
            "Merged pending posts"
        );

        let event = PostsMergedEvent {
            posts: merged.iter().map(PostResponse::from).collect(),
        };
        connection
            .dispatch(GatewayEventType::PostsMerged, &event)
            .await;
        Ok(())
    }

    /// Load the next older page. A request while one is in flight is dropped.
    pub async fn load_more(connection: &mut Connection) -> HandlerResult<()> {
        let viewer_id = connection.user_id().ok_or(HandlerError::NotAuthenticated)?;
        let ctx = connection.ctx().clone();

        let load = connection
            .pager()
            .load_more(ctx.post_repo(), viewer_id)
            .await?;

        let posts = match load {
            PageLoad::Loaded(page) => connection.feed_mut().extend_displayed(page),
            PageLoad::Busy => return Ok(()),
            PageLoad::Exhausted => Vec::new(),
        };

        let event = PageEvent {
            posts: posts.iter().map(PostResponse::from).collect(),
            has_more: connection.pager().has_more(),
        };
        connection.dispatch(GatewayEventType::Page, &event).await;
        Ok(())
    }
}
