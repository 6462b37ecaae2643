//! OAuth callback handling
//!
//! The callback races an immediate session read against the provider's
//! `SIGNED_IN` event for the flow, bounded by a timeout. Whichever yields a
//! session first wins; every path ends in exactly one outcome.

use std::time::Duration;

use futures::StreamExt;
use sims_core::entities::{AuthSession, OAuthProvider};
use sims_core::traits::{AuthEventStream, AuthProvider, RepoResult};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::bootstrap::{BootstrapOutcome, BootstrapService};
use super::context::ServiceContext;
use super::error::ServiceResult;

/// How a wait for an OAuth session ended
#[derive(Debug)]
pub enum SessionWait {
    Ready(AuthSession),
    TimedOut,
    Failed(String),
}

/// Final result of a callback, mapped to exactly one redirect
#[derive(Debug)]
pub enum CallbackOutcome {
    SignedIn {
        session: AuthSession,
        bootstrap: BootstrapOutcome,
    },
    TimedOut,
    Failed(String),
}

impl CallbackOutcome {
    /// Where to send the browser. Tokens travel in the fragment so they never
    /// reach server logs.
    pub fn redirect_url(&self, base: &str) -> String {
        let base = base.trim_end_matches('/');
        match self {
            Self::SignedIn { session, bootstrap } => format!(
                "{base}{}#access_token={}&refresh_token={}&expires_in={}",
                bootstrap.route.path(),
                session.access_token,
                session.refresh_token,
                session.expires_in
            ),
            Self::TimedOut => format!("{base}/login?error=timeout"),
            Self::Failed(_) => format!("{base}/login?error=oauth_failed"),
        }
    }
}

/// OAuth callback service
pub struct OAuthCallbackService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> OAuthCallbackService<'a> {
    /// Create a new OAuthCallbackService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Complete the flow started under `flow_id` and bootstrap the user
    #[instrument(skip(self, code), fields(provider = %provider, flow_id = %flow_id))]
    pub async fn handle(
        &self,
        provider: OAuthProvider,
        code: &str,
        flow_id: &str,
    ) -> ServiceResult<CallbackOutcome> {
        let auth = self.ctx.auth_provider_arc();

        // Subscribe before the exchange starts so its SIGNED_IN can't be missed
        let events = auth.events();
        let exchange = {
            let auth = auth.clone();
            let code = code.to_string();
            let flow_id = flow_id.to_string();
            tokio::spawn(async move { auth.complete_oauth(provider, &code, &flow_id).await })
        };

        let timeout = self.ctx.settings().oauth_callback_timeout;
        let session = match wait_for_session(auth.as_ref(), flow_id, events, exchange, timeout)
            .await
        {
            SessionWait::Ready(session) => session,
            SessionWait::TimedOut => {
                warn!(timeout_ms = timeout.as_millis(), "OAuth callback timed out");
                return Ok(CallbackOutcome::TimedOut);
            }
            SessionWait::Failed(reason) => {
                warn!(reason = %reason, "OAuth exchange failed");
                return Ok(CallbackOutcome::Failed(reason));
            }
        };

        let bootstrap = BootstrapService::new(self.ctx)
            .bootstrap(&session.identity)
            .await?;
        info!(user_id = %session.identity.id, "OAuth sign-in complete");

        Ok(CallbackOutcome::SignedIn { session, bootstrap })
    }
}

/// Wait for the flow's session from any source, up to `timeout`.
///
/// The event stream is dropped on return, and a still-running exchange is
/// aborted on timeout.
pub async fn wait_for_session(
    provider: &dyn AuthProvider,
    flow_id: &str,
    mut events: AuthEventStream,
    mut exchange: JoinHandle<RepoResult<AuthSession>>,
    timeout: Duration,
) -> SessionWait {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let immediate = provider.session_for_flow(flow_id);
    tokio::pin!(immediate);

    let mut immediate_done = false;
    let mut events_done = false;
    let mut exchange_done = false;

    loop {
        tokio::select! {
            read = &mut immediate, if !immediate_done => {
                immediate_done = true;
                match read {
                    Ok(Some(session)) => return SessionWait::Ready(session),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "Immediate session read failed"),
                }
            }
            event = events.next(), if !events_done => match event {
                Some(event) if event.is_sign_in_for(flow_id) => {
                    if let Some(session) = event.session {
                        return SessionWait::Ready(session);
                    }
                }
                Some(_) => {}
                None => events_done = true,
            },
            joined = &mut exchange, if !exchange_done => {
                exchange_done = true;
                match joined {
                    // The exchange result is authoritative; no need to wait for its event
                    Ok(Ok(session)) => return SessionWait::Ready(session),
                    Ok(Err(e)) => return SessionWait::Failed(e.to_string()),
                    Err(e) => return SessionWait::Failed(format!("exchange task: {e}")),
                }
            }
            () = &mut deadline => {
                if !exchange_done {
                    exchange.abort();
                }
                return SessionWait::TimedOut;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{StubOAuthClient, TestHarness};
    use sims_core::AccessRoute;

    #[tokio::test]
    async fn test_callback_signs_in_and_bootstraps() {
        let h = TestHarness::new();
        h.oauth.register_code("good-code", "bella@goth.sim", Some("bella"));
        let start = h.start_oauth(OAuthProvider::Google).await;

        let outcome = OAuthCallbackService::new(&h.ctx)
            .handle(OAuthProvider::Google, "good-code", &start)
            .await
            .unwrap();

        match &outcome {
            CallbackOutcome::SignedIn { session, bootstrap } => {
                assert_eq!(session.identity.email, "bella@goth.sim");
                assert_eq!(bootstrap.profile.username, "bella");
                assert_eq!(bootstrap.route, AccessRoute::PendingApproval);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let url = outcome.redirect_url("https://sims.example/");
        assert!(url.starts_with("https://sims.example/pending#access_token="));
    }

    #[tokio::test]
    async fn test_callback_times_out_once_without_dangling_subscription() {
        let h = TestHarness::with_callback_timeout(Duration::from_millis(50));
        let start = h.start_oauth(OAuthProvider::Discord).await;

        let outcome = OAuthCallbackService::new(&h.ctx)
            .handle(OAuthProvider::Discord, StubOAuthClient::HANGING_CODE, &start)
            .await
            .unwrap();

        assert!(matches!(outcome, CallbackOutcome::TimedOut));
        assert_eq!(
            outcome.redirect_url("https://sims.example"),
            "https://sims.example/login?error=timeout"
        );
        assert_eq!(h.auth.event_subscriber_count(), 0);
        assert_eq!(h.profiles.count(), 0);
    }

    #[tokio::test]
    async fn test_callback_reports_failed_exchange() {
        let h = TestHarness::new();
        let start = h.start_oauth(OAuthProvider::Google).await;

        let outcome = OAuthCallbackService::new(&h.ctx)
            .handle(OAuthProvider::Google, "unknown-code", &start)
            .await
            .unwrap();

        assert!(matches!(outcome, CallbackOutcome::Failed(_)));
        assert_eq!(h.auth.event_subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_flow_fails() {
        let h = TestHarness::new();
        h.oauth.register_code("good-code", "bella@goth.sim", None);

        let outcome = OAuthCallbackService::new(&h.ctx)
            .handle(OAuthProvider::Google, "good-code", "not-a-flow")
            .await
            .unwrap();

        assert!(matches!(outcome, CallbackOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_immediate_read_wins_when_session_exists() {
        let h = TestHarness::new();
        h.oauth.register_code("good-code", "bella@goth.sim", None);
        let flow_id = h.start_oauth(OAuthProvider::Google).await;
        h.ctx
            .auth_provider()
            .complete_oauth(OAuthProvider::Google, "good-code", &flow_id)
            .await
            .unwrap();

        let events = h.ctx.auth_provider().events();
        let never = tokio::spawn(std::future::pending::<RepoResult<AuthSession>>());
        let wait = wait_for_session(
            h.ctx.auth_provider(),
            &flow_id,
            events,
            never,
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(wait, SessionWait::Ready(s) if s.identity.email == "bella@goth.sim"));
    }

    #[tokio::test]
    async fn test_successful_exchange_wins_without_sign_in_event() {
        let h = TestHarness::new();
        h.oauth.register_code("good-code", "bella@goth.sim", None);
        let flow_id = h.start_oauth(OAuthProvider::Google).await;
        let session = h
            .ctx
            .auth_provider()
            .complete_oauth(OAuthProvider::Google, "good-code", &flow_id)
            .await
            .unwrap();

        // Open stream that never yields, as if the SIGNED_IN event was skipped
        let events: AuthEventStream = futures::stream::pending().boxed();
        let exchange = tokio::spawn(async move { Ok(session) });
        let wait = wait_for_session(
            h.ctx.auth_provider(),
            "flow-without-session",
            events,
            exchange,
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(wait, SessionWait::Ready(s) if s.identity.email == "bella@goth.sim"));
    }
}
