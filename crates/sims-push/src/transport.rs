//! Delivery of one push message to one device

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::{Client, Request, StatusCode};
use sims_common::config::PushConfig;
use sims_core::PushSubscription;
use thiserror::Error;
use tracing::{debug, instrument};
use web_push::{
    ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushError,
    WebPushMessageBuilder, URL_SAFE_NO_PAD,
};

use crate::message::PushMessage;

/// Seconds a push service may hold an undelivered message
const MESSAGE_TTL_SECS: u32 = 86_400;

const AES128GCM: &str = "aes128gcm";

/// Why a single send failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    /// The endpoint no longer exists; the subscription should be dropped
    #[error("endpoint gone (HTTP {0})")]
    Gone(u16),

    #[error("endpoint rejected the message (HTTP {0})")]
    Rejected(u16),

    /// The message could not be encrypted or signed for this device
    #[error("encryption error: {0}")]
    Encryption(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl SendError {
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::Gone(_))
    }

    /// Classify a non-success status
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => Self::Gone(status.as_u16()),
            other => Self::Rejected(other.as_u16()),
        }
    }
}

#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), SendError>;
}

/// Sends the message as an encrypted Web Push request signed with the VAPID key
pub struct HttpPushTransport {
    http: Client,
    vapid_subject: String,
    vapid_private_key: String,
}

impl std::fmt::Debug for HttpPushTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPushTransport")
            .field("vapid_subject", &self.vapid_subject)
            .finish_non_exhaustive()
    }
}

impl HttpPushTransport {
    /// Fails when the VAPID private key is missing or not a P-256 key
    pub fn new(config: &PushConfig) -> Result<Self, SendError> {
        VapidSignatureBuilder::from_base64_no_sub(&config.vapid_private_key, URL_SAFE_NO_PAD)
            .map_err(|e| SendError::Encryption(format!("invalid VAPID private key: {e}")))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("sims-push/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            vapid_subject: config.vapid_subject.clone(),
            vapid_private_key: config.vapid_private_key.clone(),
        })
    }

    /// Encrypt `message` for one device and sign the request
    fn build_request(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<Request, SendError> {
        let info = SubscriptionInfo::new(
            subscription.endpoint.as_str(),
            subscription.p256dh.as_str(),
            subscription.auth.as_str(),
        );
        let content =
            serde_json::to_vec(message).map_err(|e| SendError::Encryption(e.to_string()))?;

        let mut signature =
            VapidSignatureBuilder::from_base64(&self.vapid_private_key, URL_SAFE_NO_PAD, &info)
                .map_err(encryption_error)?;
        signature.add_claim("sub", self.vapid_subject.as_str());

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_ttl(MESSAGE_TTL_SECS);
        builder.set_payload(ContentEncoding::Aes128Gcm, &content);
        builder.set_vapid_signature(signature.build().map_err(encryption_error)?);
        let push = builder.build().map_err(encryption_error)?;

        let mut request = self
            .http
            .post(push.endpoint.to_string())
            .header("TTL", push.ttl.to_string());
        if let Some(payload) = push.payload {
            request = request
                .header(CONTENT_ENCODING, AES128GCM)
                .header(CONTENT_TYPE, "application/octet-stream");
            // Carries the `Authorization: vapid ...` header
            for (name, value) in payload.crypto_headers {
                request = request.header(name, value);
            }
            request = request.body(payload.content);
        }
        request
            .build()
            .map_err(|e| SendError::Transport(e.to_string()))
    }
}

fn encryption_error(e: WebPushError) -> SendError {
    SendError::Encryption(e.to_string())
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    #[instrument(skip_all, fields(subscription_id = %subscription.id))]
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), SendError> {
        let request = self.build_request(subscription, message)?;
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "Push accepted");
            Ok(())
        } else {
            Err(SendError::from_status(status))
        }
    }
}
