//! Provides the token side of the flow: the exchange request and what it yields.
//!
//! This module:
//! TokenRequest: The parameters sent to the provider's token endpoint, already shaped per provider.
//! TokenResponseBody: The raw JSON answer of the token endpoint.
//! ProviderTokenSet: The validated result of a successful exchange.
//! AccessToken / RefreshToken: Credentials that never print their value through `Debug`.
use std::{fmt, time::Duration};

use serde::Deserialize;

use crate::{
    code::AuthorizationRequest,
    config::ProviderConfig,
    error::Error,
    provider::{ProviderId, TokenRequestShape},
};

/// Sent as Naver's `state` when the caller has none to forward.
pub const NAVER_FALLBACK_STATE: &str = "STATE";

/// Represents an OAuth 2.0 access token, used to call the provider's user-info endpoint.
#[derive(Clone, PartialEq)]
pub struct AccessToken(pub(crate) String);

impl AccessToken {
    pub fn new(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn value_as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Represents an OAuth 2.0 refresh token. Returned when the provider issues one; never renewed here.
#[derive(Clone, PartialEq)]
pub struct RefreshToken(pub(crate) String);

impl RefreshToken {
    pub fn value_as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshToken(<redacted>)")
    }
}

/// Tokens obtained for one authentication attempt. Never persisted by this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderTokenSet {
    pub(crate) access_token: AccessToken,
    pub(crate) refresh_token: Option<RefreshToken>,
    pub(crate) token_type: String,
    pub(crate) expires_in_seconds: Option<u64>,
}

impl ProviderTokenSet {
    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.refresh_token.as_ref()
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_in_seconds(&self) -> Option<u64> {
        self.expires_in_seconds
    }
}

/// A structure used to send an authorization-code exchange to a provider's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenRequest {
    provider: ProviderId,
    shape: TokenRequestShape,
    token_endpoint: String,
    params: Vec<(&'static str, String)>,
    timeout: Duration,
}

impl TokenRequest {
    /// Creates the request from the provider's configuration and the received code.
    ///
    /// `client_secret` is left out when the configuration has none. `redirect_uri`
    /// falls back to the configured one when the request does not carry it.
    /// Naver always gets a `state`: the callback's one, or [`NAVER_FALLBACK_STATE`].
    pub fn new(config: &ProviderConfig, req: &AuthorizationRequest) -> Self {
        let provider = config.provider;
        let mut params = vec![
            ("grant_type", "authorization_code".to_string()),
            ("client_id", config.client_id.0.clone()),
        ];
        if let Some(secret) = config.client_secret() {
            params.push(("client_secret", secret.to_string()));
        }
        if provider.sends_redirect_uri_on_exchange() {
            let redirect_uri = if req.redirect_uri.0.is_empty() {
                config.redirect_uri.0.clone()
            } else {
                req.redirect_uri.0.clone()
            };
            params.push(("redirect_uri", redirect_uri));
        }
        params.push(("code", req.code.0.clone()));
        if provider.sends_state_on_exchange() {
            let state = req
                .state
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(NAVER_FALLBACK_STATE);
            params.push(("state", state.to_string()));
        }

        Self {
            provider,
            shape: provider.token_request_shape(),
            token_endpoint: config.token_endpoint.0.clone(),
            params,
            timeout: config.timeout,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn shape(&self) -> TokenRequestShape {
        self.shape
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Naver sends `expires_in` as a string, Kakao and Google as a number.
/// Anything else is kept as `Other` and read as unknown.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(u64),
    Fractional(f64),
    Text(String),
    Other(serde_json::Value),
}

impl ExpiresIn {
    fn seconds(&self) -> Option<u64> {
        match self {
            ExpiresIn::Seconds(v) => Some(*v),
            ExpiresIn::Fractional(v) => seconds_from_f64(*v),
            ExpiresIn::Text(v) => {
                let v = v.trim();
                v.parse()
                    .ok()
                    .or_else(|| v.parse().ok().and_then(seconds_from_f64))
            }
            ExpiresIn::Other(_) => None,
        }
    }
}

fn seconds_from_f64(v: f64) -> Option<u64> {
    (v.is_finite() && v >= 0.0).then(|| v as u64)
}

/// The token endpoint's JSON body, before it is known to be a success.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponseBody {
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<ExpiresIn>,
    error: Option<String>,
    error_description: Option<String>,
}

impl TokenResponseBody {
    /// A body without a non-empty `access_token` is a rejected exchange,
    /// even when the provider answered with a success status.
    pub(crate) fn into_token_set(self, provider: ProviderId) -> Result<ProviderTokenSet, Error> {
        let access_token = match self.access_token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                let cause = match (self.error, self.error_description) {
                    (Some(err), Some(desc)) => format!("{err}: {desc}"),
                    (Some(err), None) => err,
                    (None, _) => "response has no access_token".to_string(),
                };
                return Err(Error::Exchange { provider, cause });
            }
        };
        Ok(ProviderTokenSet {
            access_token: AccessToken(access_token),
            refresh_token: self
                .refresh_token
                .filter(|t| !t.is_empty())
                .map(RefreshToken),
            token_type: self.token_type.unwrap_or_else(|| "bearer".to_string()),
            expires_in_seconds: self.expires_in.as_ref().and_then(ExpiresIn::seconds),
        })
    }
}
