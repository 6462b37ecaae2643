//! Change-feed events routed to one connection

use super::HandlerResult;
use crate::connection::{Change, Connection};
use crate::events::{GatewayEventType, NewPostsEvent, ProfileUpdatedEvent};
use sims_core::{ChangeKind, Profile};
use sims_service::dto::ProfileResponse;

/// Turns change-feed events into dispatches
pub struct ChangeHandler;

impl ChangeHandler {
    pub async fn handle(connection: &mut Connection, change: Change) -> HandlerResult<()> {
        match change {
            Change::Feed(event) => {
                if connection.feed_mut().handle_event(&event).await? {
                    let count = connection.feed().pending_count();
                    connection
                        .dispatch(GatewayEventType::NewPosts, &NewPostsEvent { count })
                        .await;
                }
            }
            Change::Profile(event) => {
                if event.kind != ChangeKind::Update {
                    return Ok(());
                }
                let profile: Profile = match event.record_as() {
                    Ok(profile) => profile,
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping undecodable profile event");
                        return Ok(());
                    }
                };
                if connection.session_store().replace_profile(profile.clone()) {
                    let event = ProfileUpdatedEvent {
                        profile: ProfileResponse::from(&profile),
                    };
                    connection
                        .dispatch(GatewayEventType::ProfileUpdated, &event)
                        .await;
                }
            }
        }
        Ok(())
    }
}
