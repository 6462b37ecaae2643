//! Gateway integration tests
//!
//! The REST API and the gateway share one in-memory service context, so
//! posts created over HTTP reach connected sockets through the change feed.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use integration_tests::{assert_json, PostBody, SignUpBody, TestGateway, TestServer};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_identify_then_ready() {
    let server = TestServer::start().await.unwrap();
    let gateway = TestGateway::start_with(&server.harness).await.unwrap();
    let admin = server.sign_up_admin().await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    client.identify(&admin.access_token).await.unwrap();

    let ready = client.expect_event("READY").await.unwrap();
    assert_eq!(ready["user_id"], admin.profile.id.to_string());
    assert_eq!(ready["route"]["path"], "/admin");
}

#[tokio::test]
async fn test_pending_user_is_closed_with_invite_pending() {
    let server = TestServer::start().await.unwrap();
    let gateway = TestGateway::start_with(&server.harness).await.unwrap();
    let user = server.sign_up(&SignUpBody::unique()).await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    client.identify(&user.access_token).await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), 4013);
}

#[tokio::test]
async fn test_bad_token_is_closed_with_authentication_failed() {
    let server = TestServer::start().await.unwrap();
    let gateway = TestGateway::start_with(&server.harness).await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    client.identify("garbage").await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), 4004);
}

#[tokio::test]
async fn test_heartbeat_is_acked() {
    let server = TestServer::start().await.unwrap();
    let gateway = TestGateway::start_with(&server.harness).await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    client.send_json(json!({ "op": 1 })).await.unwrap();
    let ack = client.next_json().await.unwrap();
    assert_eq!(ack["op"], 11);
}

#[tokio::test]
async fn test_new_post_is_staged_then_merged() {
    let server = TestServer::start().await.unwrap();
    let gateway = TestGateway::start_with(&server.harness).await.unwrap();
    let admin = server.sign_up_admin().await.unwrap();
    let author = server.approved_user(&admin).await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    client.identify(&admin.access_token).await.unwrap();
    client.expect_event("READY").await.unwrap();

    let response = server
        .post_auth(
            "/api/v1/posts",
            &author.access_token,
            &json!({ "content": "Just moved to Oasis Springs" }),
        )
        .await
        .unwrap();
    let post: PostBody = assert_json(response, StatusCode::CREATED).await.unwrap();

    let staged = client.expect_event("NEW_POSTS").await.unwrap();
    assert_eq!(staged["count"], 1);

    client.send_json(json!({ "op": 3 })).await.unwrap();
    let merged = client.expect_event("POSTS_MERGED").await.unwrap();
    assert_eq!(merged["posts"][0]["id"], post.id.to_string());
}

#[tokio::test]
async fn test_load_more_returns_a_page() {
    let server = TestServer::start().await.unwrap();
    let gateway = TestGateway::start_with(&server.harness).await.unwrap();
    let admin = server.sign_up_admin().await.unwrap();
    for i in 0..3 {
        server
            .post_auth(
                "/api/v1/posts",
                &admin.access_token,
                &json!({ "content": format!("Diary entry {i}") }),
            )
            .await
            .unwrap();
    }

    let mut client = gateway.connect().await.unwrap();
    client.identify(&admin.access_token).await.unwrap();
    client.expect_event("READY").await.unwrap();

    client.send_json(json!({ "op": 4 })).await.unwrap();
    let page = client.expect_event("PAGE").await.unwrap();
    assert_eq!(page["posts"].as_array().unwrap().len(), 3);
    assert_eq!(page["has_more"], false);
}

#[tokio::test]
async fn test_feed_op_before_identify_closes() {
    let server = TestServer::start().await.unwrap();
    let gateway = TestGateway::start_with(&server.harness).await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    client.send_json(json!({ "op": 4 })).await.unwrap();
    assert_eq!(client.expect_close().await.unwrap(), 4003);
}
