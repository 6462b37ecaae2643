//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers and making HTTP and
//! WebSocket requests against them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use reqwest::{redirect, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use crate::fixtures::{AdminInviteBody, SessionBody, SignUpBody, ADMIN_EMAIL};
use sims_api::{create_app, AppState};
use sims_common::AppConfig;
use sims_gateway::connection::ConnectionManager;
use sims_gateway::GatewayState;
use sims_service::testing::TestHarness;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

async fn serve(app: axum::Router) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    Ok((addr, handle))
}

/// REST API bound to an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub harness: Arc<TestHarness>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start on a fresh harness whose `admin@sims.test` signs up as admin
    pub async fn start() -> Result<Self> {
        Self::start_with(Arc::new(TestHarness::with_admin_emails(&[ADMIN_EMAIL]))).await
    }

    pub async fn start_with(harness: Arc<TestHarness>) -> Result<Self> {
        let state = AppState::new(harness.ctx.clone(), AppConfig::for_testing());
        let (addr, handle) = serve(create_app(state)).await?;

        // Redirects are asserted on, never followed
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self {
            addr,
            client,
            harness,
            _handle: handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    pub async fn post_auth<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    pub async fn patch_auth<T: Serialize>(
        &self,
        path: &str,
        token: &str,
        body: &T,
    ) -> Result<Response> {
        Ok(self
            .client
            .patch(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?)
    }

    pub async fn put_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// Sign up and return the session
    pub async fn sign_up(&self, request: &SignUpBody) -> Result<SessionBody> {
        let response = self.post("/api/v1/auth/signup", request).await?;
        assert_json(response, StatusCode::CREATED).await
    }

    /// Sign up the admin account
    pub async fn sign_up_admin(&self) -> Result<SessionBody> {
        self.sign_up(&SignUpBody::admin()).await
    }

    /// Sign up a user and have `admin` approve their invite
    pub async fn approved_user(&self, admin: &SessionBody) -> Result<SessionBody> {
        let session = self.sign_up(&SignUpBody::unique()).await?;
        self.approve(admin, session.profile.id).await?;
        Ok(session)
    }

    /// Approve the pending invite used by `user_id`
    pub async fn approve(&self, admin: &SessionBody, user_id: uuid::Uuid) -> Result<()> {
        let response = self
            .get_auth("/api/v1/admin/invites?status=pending", &admin.access_token)
            .await?;
        let invites: Vec<AdminInviteBody> = assert_json(response, StatusCode::OK).await?;
        let invite = invites
            .into_iter()
            .find(|i| i.used_by == user_id)
            .context("no pending invite for user")?;

        let path = format!("/api/v1/admin/invites/{}/approve", invite.id);
        let response = self.post_auth(&path, &admin.access_token, &json!({})).await?;
        assert_status(response, StatusCode::OK).await
    }
}

/// WebSocket gateway bound to an ephemeral port
pub struct TestGateway {
    pub addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl TestGateway {
    pub async fn start_with(harness: &TestHarness) -> Result<Self> {
        let state = GatewayState::new(
            harness.ctx.clone(),
            ConnectionManager::new_shared(),
            AppConfig::for_testing(),
        );
        let (addr, handle) = serve(sims_gateway::create_app(state)).await?;
        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    /// Connect and consume the Hello frame
    pub async fn connect(&self) -> Result<GatewayClient> {
        let url = format!("ws://{}/gateway", self.addr);
        let (stream, _) = connect_async(url).await?;
        let mut client = GatewayClient { stream };
        let hello = client.next_json().await?;
        anyhow::ensure!(hello["op"] == 10, "expected Hello, got {hello}");
        Ok(client)
    }
}

/// Thin JSON client over a gateway socket
pub struct GatewayClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl GatewayClient {
    pub async fn send_json(&mut self, value: Value) -> Result<()> {
        self.stream.send(Message::Text(value.to_string())).await?;
        Ok(())
    }

    pub async fn identify(&mut self, token: &str) -> Result<()> {
        self.send_json(json!({ "op": 2, "d": { "token": token } }))
            .await
    }

    /// Next frame, which must be text
    pub async fn next_frame(&mut self) -> Result<Message> {
        tokio::time::timeout(Duration::from_secs(5), self.stream.next())
            .await
            .context("timed out waiting for a gateway frame")?
            .context("gateway closed the stream")?
            .map_err(Into::into)
    }

    pub async fn next_json(&mut self) -> Result<Value> {
        match self.next_frame().await? {
            Message::Text(text) => Ok(serde_json::from_str(&text)?),
            other => anyhow::bail!("expected a text frame, got {other:?}"),
        }
    }

    /// Skip frames until a dispatch of `event` arrives
    pub async fn expect_event(&mut self, event: &str) -> Result<Value> {
        loop {
            let frame = self.next_json().await?;
            if frame["t"] == event {
                return Ok(frame["d"].clone());
            }
        }
    }

    /// Close code of the next frame, which must be a close frame
    pub async fn expect_close(&mut self) -> Result<u16> {
        match self.next_frame().await? {
            Message::Close(Some(frame)) => Ok(u16::from(frame.code)),
            other => anyhow::bail!("expected a close frame, got {other:?}"),
        }
    }
}

/// Parse the body after checking the status
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!("Expected status {expected_status}, got {status}. Body: {body}");
    }
    Ok(())
}

/// Error code from an `{ "error": { "code": .. } }` body
pub async fn error_code(response: Response) -> Result<(StatusCode, Value)> {
    let status = response.status();
    let body: Value = response.json().await?;
    Ok((status, body["error"].clone()))
}
