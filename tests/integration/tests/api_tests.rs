//! API integration tests
//!
//! Every test runs the full router over an in-memory service context, so no
//! database or Redis is needed.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use integration_tests::{
    assert_json, assert_status, error_code, NotificationBody, PageBody, PostBody, ProfileBody,
    SessionBody, SignUpBody, TestServer,
};
use reqwest::StatusCode;
use serde_json::{json, Value};

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/health").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Auth and routing
// ============================================================================

#[tokio::test]
async fn test_sign_up_routes_new_user_to_pending() {
    let server = TestServer::start().await.unwrap();
    let request = SignUpBody::unique();

    let session = server.sign_up(&request).await.unwrap();
    assert_eq!(Some(session.profile.username.clone()), request.username);
    assert!(!session.profile.is_admin);
    assert_eq!(session.route.name, "pending_approval");
    assert_eq!(session.route.path, "/pending");

    let response = server
        .get_auth("/api/v1/auth/me", &session.access_token)
        .await
        .unwrap();
    let me: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(me["invite_status"], "pending");
    assert_eq!(me["route"]["path"], "/pending");
}

#[tokio::test]
async fn test_admin_email_is_routed_to_admin() {
    let server = TestServer::start().await.unwrap();
    let admin = server.sign_up_admin().await.unwrap();
    assert!(admin.profile.is_admin);
    assert_eq!(admin.route.path, "/admin");
}

#[tokio::test]
async fn test_sign_in_and_refresh() {
    let server = TestServer::start().await.unwrap();
    let request = SignUpBody::unique();
    server.sign_up(&request).await.unwrap();

    let response = server
        .post(
            "/api/v1/auth/signin",
            &json!({ "email": request.email, "password": request.password }),
        )
        .await
        .unwrap();
    let session: SessionBody = assert_json(response, StatusCode::OK).await.unwrap();

    let response = server
        .post(
            "/api/v1/auth/refresh",
            &json!({ "refresh_token": session.refresh_token }),
        )
        .await
        .unwrap();
    let refreshed: SessionBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(refreshed.profile.id, session.profile.id);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let server = TestServer::start().await.unwrap();
    let request = SignUpBody::unique();
    server.sign_up(&request).await.unwrap();

    let response = server
        .post(
            "/api/v1/auth/signin",
            &json!({ "email": request.email, "password": "Wrongpass99" }),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/api/v1/auth/me").await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Invite gate
// ============================================================================

#[tokio::test]
async fn test_pending_user_is_gated_until_approved() {
    let server = TestServer::start().await.unwrap();
    let admin = server.sign_up_admin().await.unwrap();
    let user = server.sign_up(&SignUpBody::unique()).await.unwrap();

    let response = server
        .get_auth("/api/v1/feed", &user.access_token)
        .await
        .unwrap();
    let (status, error) = error_code(response).await.unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error["code"], "INVITE_PENDING");
    assert_eq!(error["details"]["invite_status"], "pending");

    server.approve(&admin, user.profile.id).await.unwrap();

    let response = server
        .post_auth("/api/v1/invites/me/refresh", &user.access_token, &json!({}))
        .await
        .unwrap();
    let status: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(status["status"], "approved");
    assert_eq!(status["route"]["path"], "/feed");

    let response = server
        .get_auth("/api/v1/feed", &user.access_token)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_non_admin_cannot_list_invites() {
    let server = TestServer::start().await.unwrap();
    let user = server.sign_up(&SignUpBody::unique()).await.unwrap();

    let response = server
        .get_auth("/api/v1/admin/invites", &user.access_token)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Posts, mentions and notifications
// ============================================================================

#[tokio::test]
async fn test_post_with_mention_notifies_the_mentioned_user() {
    let server = TestServer::start().await.unwrap();
    let admin = server.sign_up_admin().await.unwrap();
    let author = server.approved_user(&admin).await.unwrap();
    let friend = server.approved_user(&admin).await.unwrap();

    let content = format!("Pool party tonight @{}!", friend.profile.username);
    let response = server
        .post_auth(
            "/api/v1/posts",
            &author.access_token,
            &json!({ "content": content }),
        )
        .await
        .unwrap();
    let post: PostBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert!(post
        .segments
        .iter()
        .any(|s| s["kind"] == "mention" && s["username"] == friend.profile.username));

    server
        .harness
        .wait_for_notifications(friend.profile.id, 2)
        .await;

    let response = server
        .get_auth("/api/v1/notifications", &friend.access_token)
        .await
        .unwrap();
    let page: PageBody<NotificationBody> = assert_json(response, StatusCode::OK).await.unwrap();
    let mention = page
        .items
        .iter()
        .find(|n| n.notification_type == "mention")
        .expect("mention notification");
    assert_eq!(mention.actor_id, Some(author.profile.id));
    assert_eq!(mention.reference_id, Some(post.id));
    assert!(!mention.read);

    let response = server
        .get_auth("/api/v1/feed", &friend.access_token)
        .await
        .unwrap();
    let feed: PageBody<PostBody> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(feed.items[0].id, post.id);
    assert!(!feed.has_more);
}

#[tokio::test]
async fn test_post_over_length_limit_is_rejected() {
    let server = TestServer::start().await.unwrap();
    let admin = server.sign_up_admin().await.unwrap();

    let response = server
        .post_auth(
            "/api/v1/posts",
            &admin.access_token,
            &json!({ "content": "a".repeat(281) }),
        )
        .await
        .unwrap();
    let (status, error) = error_code(response).await.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_like_is_idempotent_and_only_author_deletes() {
    let server = TestServer::start().await.unwrap();
    let admin = server.sign_up_admin().await.unwrap();
    let author = server.approved_user(&admin).await.unwrap();
    let reader = server.approved_user(&admin).await.unwrap();

    let response = server
        .post_auth(
            "/api/v1/posts",
            &author.access_token,
            &json!({ "content": "New couch, who dis" }),
        )
        .await
        .unwrap();
    let post: PostBody = assert_json(response, StatusCode::CREATED).await.unwrap();
    let like_path = format!("/api/v1/posts/{}/like", post.id);

    for _ in 0..2 {
        let response = server.put_auth(&like_path, &reader.access_token).await.unwrap();
        let liked: Value = assert_json(response, StatusCode::OK).await.unwrap();
        assert_eq!(liked["like_count"], 1);
        assert_eq!(liked["liked_by_me"], true);
    }

    let response = server
        .delete_auth(&like_path, &reader.access_token)
        .await
        .unwrap();
    let unliked: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(unliked["like_count"], 0);

    let post_path = format!("/api/v1/posts/{}", post.id);
    let response = server
        .delete_auth(&post_path, &reader.access_token)
        .await
        .unwrap();
    let (status, _) = error_code(response).await.unwrap();
    assert_eq!(status, StatusCode::FORBIDDEN);

    let response = server
        .delete_auth(&post_path, &author.access_token)
        .await
        .unwrap();
    assert_status(response, StatusCode::NO_CONTENT).await.unwrap();

    let response = server.get_auth(&post_path, &reader.access_token).await.unwrap();
    let (status, _) = error_code(response).await.unwrap();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_update_round_trip() {
    let server = TestServer::start().await.unwrap();
    let user = server.sign_up(&SignUpBody::unique()).await.unwrap();

    let response = server
        .patch_auth(
            "/api/v1/profiles/me",
            &user.access_token,
            &json!({ "bio": "Aspiring chef" }),
        )
        .await
        .unwrap();
    let profile: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(profile["bio"], "Aspiring chef");

    let response = server
        .get_auth("/api/v1/profiles/me", &user.access_token)
        .await
        .unwrap();
    let profile: ProfileBody = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(profile.id, user.profile.id);
}

// ============================================================================
// OAuth callback
// ============================================================================

#[tokio::test]
async fn test_oauth_callback_redirects_with_session() {
    let server = TestServer::start().await.unwrap();
    server
        .harness
        .oauth
        .register_code("good-code", "oauth-sim@sims.test", Some("oauthsim"));

    let response = server.get("/api/v1/auth/oauth/google").await.unwrap();
    let start: Value = assert_json(response, StatusCode::OK).await.unwrap();
    let flow_id = start["flow_id"].as_str().unwrap().to_string();

    let response = server
        .get(&format!(
            "/api/v1/auth/oauth/google/callback?code=good-code&state={flow_id}"
        ))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.contains("/pending#access_token="), "{location}");
}

#[tokio::test]
async fn test_oauth_provider_error_redirects_to_login() {
    let server = TestServer::start().await.unwrap();
    let response = server
        .get("/api/v1/auth/oauth/google/callback?error=access_denied")
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.ends_with("/login?error=oauth_failed"), "{location}");
}

#[tokio::test]
async fn test_oauth_start_rejects_unknown_provider() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/api/v1/auth/oauth/myspace").await.unwrap();
    assert!(response.status().is_client_error());
}
