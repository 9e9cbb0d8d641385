//! Drives one login from authorization code to `ExternalIdentity`.
//!
//! ```text
//! Started -> Exchanging -> FetchingProfile -> Normalizing -> Succeeded
//!    \____________\_______________\________________\______-> Failed(kind)
//! ```
//!
//! Every call to [`OAuthOrchestrator::authenticate`] is an independent run; the only
//! shared state is the read-only `ProviderRegistry`. Transport failures that never
//! produced an HTTP response are retried a bounded number of times. Anything the
//! provider actually answered is final: authorization codes are single-use, so a
//! rejected exchange is never sent again.
//!
//! # Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use social_oauth::{config::ProviderRegistry, orchestrator::OAuthOrchestrator, provider::ProviderId};
//!
//! # async fn run() {
//! let orchestrator = OAuthOrchestrator::new(Arc::new(ProviderRegistry::from_env()));
//! let url = orchestrator.build_auth_url(ProviderId::Kakao, "state-value").unwrap();
//! // ... user comes back with ?code=...
//! let identity = orchestrator
//!     .authenticate(ProviderId::Kakao, "abc123", "https://your-app.com/callback")
//!     .await;
//! # }
//! ```
use std::{sync::Arc, time::Duration};

use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    code::{AuthUrlRequest, AuthorizationRequest},
    config::ProviderRegistry,
    error::{AuthError, AuthErrorKind, ConfigError, Error},
    executer::{Executer, TokenExchangeClient, UserInfoFetcher},
    identity::{ExternalIdentity, normalize},
    profile::{RawProfile, UserInfoRequest},
    provider::ProviderId,
    token::{ProviderTokenSet, TokenRequest},
};

/// Bounded retry for calls that never reached the provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each further one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exp)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Started,
    Exchanging,
    FetchingProfile,
    Normalizing,
    Succeeded,
    Failed(AuthErrorKind),
}

/// Tracks the state of a single run and turns failures into `AuthError`.
#[derive(Debug)]
struct Attempt {
    provider: ProviderId,
    state: AuthState,
}

impl Attempt {
    fn start(provider: ProviderId) -> Self {
        debug!(state = ?AuthState::Started, "authentication started");
        Self {
            provider,
            state: AuthState::Started,
        }
    }

    fn advance(&mut self, next: AuthState) {
        debug!(from = ?self.state, to = ?next, "state transition");
        self.state = next;
    }

    fn fail(&mut self, kind: AuthErrorKind, cause: Error) -> AuthError {
        self.advance(AuthState::Failed(kind));
        match kind {
            AuthErrorKind::NormalizationFailed => {
                error!(%kind, "authentication failed: {}", cause)
            }
            _ => warn!(%kind, "authentication failed: {}", cause),
        }
        AuthError::new(kind, self.provider, cause)
    }
}

/// Coordinates token exchange, profile fetch and normalization for every configured provider.
///
/// Generic over its executers so tests (or callers with special transport needs)
/// can swap them; the defaults talk HTTP through `reqwest`.
#[derive(Debug, Clone)]
pub struct OAuthOrchestrator<X = TokenExchangeClient, U = UserInfoFetcher> {
    registry: Arc<ProviderRegistry>,
    exchanger: X,
    fetcher: U,
    retry: RetryPolicy,
}

impl OAuthOrchestrator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        let client = reqwest::Client::new();
        Self::with_executers(
            registry,
            TokenExchangeClient::with_client(client.clone()),
            UserInfoFetcher::with_client(client),
        )
    }
}

impl<X, U> OAuthOrchestrator<X, U> {
    pub fn with_executers(registry: Arc<ProviderRegistry>, exchanger: X, fetcher: U) -> Self {
        Self {
            registry,
            exchanger,
            fetcher,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Authorization URL for `provider`, carrying the caller's `state` untouched.
    pub fn build_auth_url(&self, provider: ProviderId, state: &str) -> Result<String, ConfigError> {
        let config = self
            .registry
            .get(provider)
            .map_err(|_| ConfigError::NotConfigured { provider })?;
        AuthUrlRequest::new(config, state).into_url()
    }

    async fn with_retry<T, F, Fut>(
        &self,
        stage: &'static str,
        mut call: F,
    ) -> Result<T, Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let mut retries = 0;
        loop {
            match call().await {
                Err(e) if e.is_retryable() && retries < self.retry.max_retries => {
                    retries += 1;
                    let delay = self.retry.delay_for(retries);
                    warn!(stage, retries, ?delay, "retrying after transport failure: {}", e);
                    tokio::time::sleep(delay).await;
                }
                res => return res,
            }
        }
    }
}

impl<X, U> OAuthOrchestrator<X, U>
where
    X: for<'a> Executer<'a, TokenRequest, Response = ProviderTokenSet, Error = Error>,
    U: for<'a> Executer<'a, UserInfoRequest, Response = RawProfile, Error = Error>,
{
    /// Exchanges `code` and returns the normalized identity of the user.
    pub async fn authenticate(
        &self,
        provider: ProviderId,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ExternalIdentity, AuthError> {
        self.authenticate_request(AuthorizationRequest::new(provider, code, redirect_uri))
            .await
    }

    /// Same as [`authenticate`](Self::authenticate), forwarding the callback's `state`
    /// to providers that expect it on the token call (Naver).
    pub async fn authenticate_with_state(
        &self,
        provider: ProviderId,
        code: &str,
        redirect_uri: &str,
        state: &str,
    ) -> Result<ExternalIdentity, AuthError> {
        let req = AuthorizationRequest::new(provider, code, redirect_uri).with_state(state);
        self.authenticate_request(req).await
    }

    pub async fn authenticate_request(
        &self,
        req: AuthorizationRequest,
    ) -> Result<ExternalIdentity, AuthError> {
        let span = info_span!(
            "oauth_authenticate",
            provider = %req.provider,
            attempt_id = %Uuid::new_v4()
        );
        self.run(req).instrument(span).await
    }

    async fn run(&self, req: AuthorizationRequest) -> Result<ExternalIdentity, AuthError> {
        let provider = req.provider;
        let mut attempt = Attempt::start(provider);

        let config = self
            .registry
            .get(provider)
            .map_err(|e| attempt.fail(AuthErrorKind::UnknownProvider, e))?;

        attempt.advance(AuthState::Exchanging);
        let token_req = TokenRequest::new(config, &req);
        let (exchanger, token_req) = (&self.exchanger, &token_req);
        let tokens = self
            .with_retry("token_exchange", move || exchanger.execute(token_req))
            .await
            .map_err(|e| attempt.fail(AuthErrorKind::ExchangeFailed, e))?;

        attempt.advance(AuthState::FetchingProfile);
        let info_req = UserInfoRequest::new(config, tokens.access_token());
        let (fetcher, info_req) = (&self.fetcher, &info_req);
        let profile = self
            .with_retry("user_info", move || fetcher.execute(info_req))
            .await
            .map_err(|e| attempt.fail(AuthErrorKind::ProfileFetchFailed, e))?;

        attempt.advance(AuthState::Normalizing);
        let identity = normalize(provider, profile)
            .map_err(|e| attempt.fail(AuthErrorKind::NormalizationFailed, e))?;

        attempt.advance(AuthState::Succeeded);
        info!("authentication succeeded");
        Ok(identity)
    }
}
