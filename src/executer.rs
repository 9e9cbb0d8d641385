//! Provides an asynchronous execution framework for sending HTTP requests to identity providers.
//!
//! This module:
//! - Defines the Executer trait, which provides a unified interface for making HTTP requests.
//! - Implements executers for the authorization-code exchange and the user-info fetch.
//!
//! Each `execute` issues exactly one outbound call; retrying is the orchestrator's decision.
//! Dropping the returned future aborts the call in flight.

use std::{error::Error as StdError, pin::Pin};

use http::{StatusCode, header::ACCEPT};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, error};

use crate::{
    code::AuthorizationRequest,
    config::ProviderConfig,
    error::{ConfigError, Error},
    profile::{RawProfile, UserInfoRequest},
    provider::{ProviderId, TokenRequestShape},
    token::{AccessToken, ProviderTokenSet, TokenRequest, TokenResponseBody},
};

/// generic asynchronous execution interface for sending HTTP requests.
/// Key Components:
/// - Req: The request type that the executer will handle.
/// - Response: The expected response type.
/// - Error: The error type that will be returned on failure.
/// - Future: The asynchronous execution result, returning either Response or Error
pub trait Executer<'a, Req>
where
    Req: Send,
{
    type Response;
    type Error: StdError;
    type Future: Future<Output = Result<Self::Response, Self::Error>> + Send + 'a;

    fn execute(&'a self, req: &'a Req) -> Self::Future;
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + Send + 'a>>;

/// Swaps an authorization code for provider tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenExchangeClient {
    client: Client,
}

impl TokenExchangeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares an existing `reqwest::Client` (and its connection pool).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn exchange(
        &self,
        config: &ProviderConfig,
        req: &AuthorizationRequest,
    ) -> Result<ProviderTokenSet, Error> {
        let token_req = TokenRequest::new(config, req);
        self.execute(&token_req).await
    }
}

/// Request Workflow
/// 1. Parse the token endpoint URL.
/// 2. Send the parameters as a form body (`POST`) or a query string (`GET`), per provider.
/// 3. Reject any non-success status without reading further.
/// 4. Parse the body and require an `access_token`.
impl<'a> Executer<'a, TokenRequest> for TokenExchangeClient {
    type Response = ProviderTokenSet;
    type Error = Error;
    type Future = BoxFuture<'a, ProviderTokenSet>;

    fn execute(&'a self, req: &'a TokenRequest) -> Self::Future {
        Box::pin(async move {
            let provider = req.provider();
            let url = parse_endpoint(provider, "token_endpoint", req.token_endpoint())?;

            let builder = match req.shape() {
                TokenRequestShape::PostForm => self.client.post(url).form(req.params()),
                TokenRequestShape::GetQuery => self.client.get(url).query(req.params()),
            };
            debug!(%provider, shape = ?req.shape(), "sending token request");
            let res = builder
                .header(ACCEPT, "application/json")
                .timeout(req.timeout())
                .send()
                .await
                .map_err(|e| send_failed(provider, e))?;

            let status = res.status();
            if !status.is_success() {
                let body = res.text().await.unwrap_or_default();
                error!(%provider, %status, "token endpoint rejected the exchange");
                return Err(Error::Exchange {
                    provider,
                    cause: rejected(status, &body),
                });
            }

            let body = res.json::<TokenResponseBody>().await.map_err(|e| {
                error!(%provider, "Failed to parse token response: {:?}", e);
                Error::Transport {
                    provider,
                    cause: format!("malformed token response: {e}"),
                    retryable: false,
                }
            })?;
            body.into_token_set(provider)
        })
    }
}

/// Retrieves the authenticated user's profile with an access token.
#[derive(Debug, Clone, Default)]
pub struct UserInfoFetcher {
    client: Client,
}

impl UserInfoFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(
        &self,
        config: &ProviderConfig,
        access_token: &AccessToken,
    ) -> Result<RawProfile, Error> {
        let req = UserInfoRequest::new(config, access_token);
        self.execute(&req).await
    }
}

/// Request Workflow
/// 1. Send `GET` with `Authorization: Bearer <token>`.
/// 2. Reject any non-success status.
/// 3. Parse the body and strip the provider's envelope, if it has one.
impl<'a> Executer<'a, UserInfoRequest> for UserInfoFetcher {
    type Response = RawProfile;
    type Error = Error;
    type Future = BoxFuture<'a, RawProfile>;

    fn execute(&'a self, req: &'a UserInfoRequest) -> Self::Future {
        Box::pin(async move {
            let provider = req.provider();
            let url = parse_endpoint(provider, "user_info_endpoint", req.user_info_endpoint())?;

            let res = self
                .client
                .get(url)
                .bearer_auth(req.access_token().value_as_str())
                .header(ACCEPT, "application/json")
                .timeout(req.timeout())
                .send()
                .await
                .map_err(|e| send_failed(provider, e))?;

            let status = res.status();
            if !status.is_success() {
                let body = res.text().await.unwrap_or_default();
                error!(%provider, %status, "user info endpoint rejected the token");
                return Err(Error::UserInfo {
                    provider,
                    cause: rejected(status, &body),
                });
            }

            let body = res.json::<Value>().await.map_err(|e| {
                error!(%provider, "Failed to parse user info: {:?}", e);
                Error::UserInfo {
                    provider,
                    cause: format!("unparseable user info body: {e}"),
                }
            })?;
            RawProfile::from_body(provider, body)
        })
    }
}

fn parse_endpoint(provider: ProviderId, field: &'static str, endpoint: &str) -> Result<Url, Error> {
    Url::parse(endpoint).map_err(|e| {
        error!(%provider, "Failed to parse url: {:?}", e);
        Error::Config(ConfigError::InvalidUrl {
            provider,
            field,
            cause: e.to_string(),
        })
    })
}

/// `send()` failed, so no HTTP response was observed.
fn send_failed(provider: ProviderId, e: reqwest::Error) -> Error {
    error!(%provider, "Failed to send request: {:?}", e);
    let retryable = e.is_timeout() || e.is_connect() || e.is_request();
    let cause = if e.is_timeout() {
        format!("request timed out: {e}")
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        format!("request failed: {e}")
    };
    Error::Transport {
        provider,
        cause,
        retryable,
    }
}

fn rejected(status: StatusCode, body: &str) -> String {
    const MAX_BODY: usize = 256;
    let body = body.trim();
    if body.is_empty() {
        return format!("status {status}");
    }
    let shown: String = body.chars().take(MAX_BODY).collect();
    format!("status {status}: {shown}")
}
