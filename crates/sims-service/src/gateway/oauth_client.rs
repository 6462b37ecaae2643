//! OAuth authorization-code client for Google and Discord

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use sims_common::config::{OAuthConfig, OAuthProviderConfig};
use sims_core::entities::OAuthProvider;
use sims_core::traits::RepoResult;
use sims_core::DomainError;
use tracing::{debug, instrument};

/// What a provider tells us about the signed-in user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthUserInfo {
    pub email: String,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait OAuthClient: Send + Sync {
    /// Consent page URL carrying `state` through the round trip
    fn authorize_url(&self, provider: OAuthProvider, state: &str) -> RepoResult<String>;

    /// Trade a callback code for the user's profile
    async fn exchange_code(&self, provider: OAuthProvider, code: &str)
        -> RepoResult<OAuthUserInfo>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DiscordUser {
    id: String,
    username: String,
    global_name: Option<String>,
    avatar: Option<String>,
    email: Option<String>,
}

/// reqwest-backed client
#[derive(Debug, Clone)]
pub struct HttpOAuthClient {
    http: Client,
    config: OAuthConfig,
    callback_base: String,
}

impl HttpOAuthClient {
    pub fn new(config: OAuthConfig, public_url: &str) -> RepoResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("sims-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::ExternalServiceError(format!("http client: {e}")))?;

        Ok(Self {
            http,
            config,
            callback_base: public_url.trim_end_matches('/').to_string(),
        })
    }

    fn provider_config(&self, provider: OAuthProvider) -> RepoResult<&OAuthProviderConfig> {
        match provider {
            OAuthProvider::Google => self.config.google.as_ref(),
            OAuthProvider::Discord => self.config.discord.as_ref(),
        }
        .ok_or_else(|| DomainError::UnsupportedProvider(provider.to_string()))
    }

    fn redirect_uri(&self, provider: OAuthProvider) -> String {
        format!("{}/api/v1/auth/oauth/{provider}/callback", self.callback_base)
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        access_token: &str,
    ) -> RepoResult<T> {
        self.http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(external)?
            .json::<T>()
            .await
            .map_err(external)
    }
}

fn external(err: reqwest::Error) -> DomainError {
    DomainError::ExternalServiceError(format!("oauth: {err}"))
}

#[async_trait]
impl OAuthClient for HttpOAuthClient {
    fn authorize_url(&self, provider: OAuthProvider, state: &str) -> RepoResult<String> {
        let config = self.provider_config(provider)?;
        let redirect_uri = self.redirect_uri(provider);

        let url = Url::parse_with_params(
            &config.authorize_url,
            &[
                ("client_id", config.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", config.scopes.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| DomainError::InvalidUrl(format!("{}: {e}", config.authorize_url)))?;

        Ok(url.into())
    }

    #[instrument(skip(self, code), fields(provider = %provider))]
    async fn exchange_code(
        &self,
        provider: OAuthProvider,
        code: &str,
    ) -> RepoResult<OAuthUserInfo> {
        let config = self.provider_config(provider)?;
        let redirect_uri = self.redirect_uri(provider);

        let token: TokenResponse = self
            .http
            .post(&config.token_url)
            .form(&[
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.as_str()),
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(external)?
            .json()
            .await
            .map_err(external)?;
        debug!("OAuth code exchanged");

        match provider {
            OAuthProvider::Google => {
                let user: GoogleUser = self
                    .fetch_json(&config.userinfo_url, &token.access_token)
                    .await?;
                Ok(OAuthUserInfo {
                    email: user.email,
                    username: None,
                    display_name: user.name,
                    avatar_url: user.picture,
                })
            }
            OAuthProvider::Discord => {
                let user: DiscordUser = self
                    .fetch_json(&config.userinfo_url, &token.access_token)
                    .await?;
                let email = user.email.ok_or_else(|| {
                    DomainError::ExternalServiceError("discord account has no email".to_string())
                })?;
                let avatar_url = user.avatar.map(|hash| {
                    format!("https://cdn.discordapp.com/avatars/{}/{hash}.png", user.id)
                });
                Ok(OAuthUserInfo {
                    email,
                    username: Some(user.username),
                    display_name: user.global_name,
                    avatar_url,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuthConfig {
        OAuthConfig {
            google: Some(OAuthProviderConfig {
                client_id: "client-123".to_string(),
                client_secret: "secret".to_string(),
                authorize_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo".to_string(),
                scopes: "openid email profile".to_string(),
            }),
            discord: None,
            callback_timeout_secs: 10,
            app_redirect_base: "http://localhost:5173".to_string(),
        }
    }

    #[test]
    fn test_authorize_url_carries_state_and_callback() {
        let client = HttpOAuthClient::new(config(), "http://localhost:8080/").unwrap();
        let url = client
            .authorize_url(OAuthProvider::Google, "flow-1")
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(params["state"], "flow-1");
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(
            params["redirect_uri"],
            "http://localhost:8080/api/v1/auth/oauth/google/callback"
        );
        assert_eq!(params["scope"], "openid email profile");
    }

    #[test]
    fn test_unconfigured_provider_is_unsupported() {
        let client = HttpOAuthClient::new(config(), "http://localhost:8080").unwrap();
        let err = client
            .authorize_url(OAuthProvider::Discord, "flow-1")
            .unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedProvider(p) if p == "discord"));
    }
}
