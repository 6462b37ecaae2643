//! Route definitions
//!
//! All API routes organized by domain and mounted under /api/v1.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{auth, friends, health, invites, notifications, oauth, posts, profiles, push};
use crate::state::AppState;

/// Headroom over the image limit so oversized uploads reach the service's own check
const UPLOAD_BODY_SLACK: usize = 64 * 1024;

/// Create the main API router. `max_upload_bytes` bounds avatar bodies.
pub fn create_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes(max_upload_bytes))
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health_check))
}

fn api_v1_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(auth_routes())
        .merge(invite_routes())
        .merge(post_routes())
        .merge(notification_routes())
        .merge(friend_routes())
        .merge(profile_routes(max_upload_bytes))
        .merge(push_routes())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/signout", post(auth::sign_out))
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", post(auth::create_profile))
        .route("/auth/oauth/:provider", get(oauth::start))
        .route("/auth/oauth/:provider/callback", get(oauth::callback))
}

fn invite_routes() -> Router<AppState> {
    Router::new()
        .route("/invites/me", get(invites::my_invite))
        .route("/invites/me/status", get(invites::my_status))
        .route("/invites/me/refresh", post(invites::refresh_status))
        .route("/admin/invites", get(invites::list_all))
        .route("/admin/invites/:invite_id/approve", post(invites::approve))
        .route("/admin/invites/:invite_id/reject", post(invites::reject))
}

fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/feed", get(posts::list_feed))
        .route("/posts", post(posts::create_post))
        .route("/posts/:post_id", get(posts::get_post).delete(posts::delete_post))
        .route(
            "/posts/:post_id/comments",
            get(posts::list_comments).post(posts::add_comment),
        )
        .route("/posts/:post_id/like", put(posts::like).delete(posts::unlike))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route(
            "/notifications/:notification_id/read",
            post(notifications::mark_read),
        )
}

fn friend_routes() -> Router<AppState> {
    Router::new()
        .route("/friends", get(friends::list_friends))
        .route(
            "/friends/requests",
            get(friends::list_incoming).post(friends::send_request),
        )
        .route(
            "/friends/requests/:friendship_id/accept",
            post(friends::accept_request),
        )
        .route(
            "/friends/requests/:friendship_id",
            delete(friends::decline_request),
        )
        .route("/friends/status/:user_id", get(friends::status_with))
        .route("/friends/:friendship_id", delete(friends::remove_friend))
}

fn profile_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/profiles/me", get(profiles::get_me).patch(profiles::update_me))
        .route("/profiles/me/tag", put(profiles::change_tag))
        .route(
            "/profiles/me/avatar",
            put(profiles::upload_avatar)
                .layer(DefaultBodyLimit::max(max_upload_bytes + UPLOAD_BODY_SLACK)),
        )
        .route("/profiles/:username", get(profiles::get_public))
        .route("/admin/profiles/:user_id/admin", put(profiles::set_admin))
}

fn push_routes() -> Router<AppState> {
    Router::new().route(
        "/push/subscriptions",
        get(push::list).post(push::register).delete(push::unregister),
    )
}
