//! This module covers the front half of the authorization-code flow:
//! sending the user to the provider and reading what comes back.
//!
//! # Key Structures and Features
//!
//! ## `AuthUrlRequest`
//! Builds the provider's authorization URL from a `ProviderConfig` and a caller-supplied state.
//!
//! ## `CallbackParams`
//! The query parameters the provider appends to the redirect URI (`code`, `state`, or `error`).
//!
//! ## `AuthorizationRequest`
//! A received authorization code, ready to be exchanged for tokens.
//!
//! # Examples
//! ## Generating an Authorization URL
//! ```rust,no_run
//! use social_oauth::{code::AuthUrlRequest, config::ProviderConfig, provider::ProviderId, state::State};
//!
//! let config = ProviderConfig::builder(ProviderId::Kakao)
//!     .client_id("your_client_id")
//!     .redirect_uri("https://your-app.com/callback")
//!     .build()
//!     .unwrap();
//! let state = State::new().unwrap();
//!
//! let url = AuthUrlRequest::new(&config, state.value()).into_url().unwrap();
//! println!("Auth URL: {}", url);
//! ```
//!
//! ## Handling the Callback
//! ```rust,no_run
//! use social_oauth::{code::CallbackParams, provider::ProviderId};
//!
//! let params = CallbackParams::from_url("https://your-app.com/callback?code=abc&state=xyz").unwrap();
//! // compare params.state() with the stored state before going on
//! let req = params.into_request(ProviderId::Naver, "https://your-app.com/callback").unwrap();
//! ```
//!
//! # Notes
//! - State is carried, never validated, by this crate.
use std::collections::HashMap;

use itertools::Itertools;
use tracing::error;
use url::Url;

use crate::{
    config::{ProviderConfig, RedirectURI},
    error::{ConfigError, Error},
    provider::ProviderId,
};

/// The value of the `code` query parameter sent back by the provider.
/// Single-use: once a provider has answered an exchange for it, it is spent.
#[derive(Debug, Clone, PartialEq)]
pub struct Code(pub(crate) String);

impl Code {
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<String> for Code {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Code {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Generates the URL that starts the login at the provider.
#[derive(Debug, Clone)]
pub struct AuthUrlRequest<'a> {
    config: &'a ProviderConfig,
    response_type: &'static str,
    state: &'a str,
}

impl<'a> AuthUrlRequest<'a> {
    pub fn new(config: &'a ProviderConfig, state: &'a str) -> Self {
        Self {
            config,
            response_type: "code",
            state,
        }
    }

    /// Appends `client_id`, `redirect_uri`, `response_type`, `scope` (when the
    /// provider has one) and `state` to the authorization endpoint.
    pub fn into_url(&self) -> Result<String, ConfigError> {
        let provider = self.config.provider;
        if self.config.client_id.0.is_empty() {
            return Err(ConfigError::MissingField {
                provider,
                field: "client_id",
            });
        }
        if self.config.redirect_uri.0.is_empty() {
            return Err(ConfigError::MissingField {
                provider,
                field: "redirect_uri",
            });
        }
        let mut url = Url::parse(&self.config.auth_endpoint.0).map_err(|e| {
            error!("Failed to parse authorize endpoint: {}", e);
            ConfigError::InvalidUrl {
                provider,
                field: "authorize_endpoint",
                cause: e.to_string(),
            }
        })?;

        let scope = self.config.scope.iter().unique().join(" ");
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("client_id", &self.config.client_id.0)
                .append_pair("redirect_uri", &self.config.redirect_uri.0)
                .append_pair("response_type", self.response_type);
            if !scope.is_empty() {
                pairs.append_pair("scope", &scope);
            }
            pairs.append_pair("state", self.state);
        }
        Ok(url.into())
    }
}

/// A single login attempt: the code from the callback and the redirect URI it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizationRequest {
    pub(crate) provider: ProviderId,
    pub(crate) code: Code,
    pub(crate) redirect_uri: RedirectURI,
    pub(crate) state: Option<String>,
}

impl AuthorizationRequest {
    /// `redirect_uri` must be the one used to obtain `code`.
    pub fn new(provider: ProviderId, code: impl Into<Code>, redirect_uri: &str) -> Self {
        Self {
            provider,
            code: code.into(),
            redirect_uri: RedirectURI(redirect_uri.to_string()),
            state: None,
        }
    }

    /// Attaches the `state` that came back with the code. Naver requires it on exchange.
    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_string());
        self
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn code(&self) -> &str {
        &self.code.0
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri.0
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }
}

/// Query parameters of the provider's redirect back to the application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackParams {
    pub fn from_url(callback_url: &str) -> Result<Self, Error> {
        let url = Url::parse(callback_url).map_err(|e| {
            error!("Failed to parse callback url: {}", e);
            Error::Config(ConfigError::InvalidValue {
                var: "callback_url".to_string(),
                cause: e.to_string(),
            })
        })?;
        let params: HashMap<_, _> = url.query_pairs().collect();
        let get = |key: &str| {
            params
                .get(key)
                .map(|v| v.to_string())
                .filter(|v| !v.is_empty())
        };
        Ok(Self {
            code: get("code"),
            state: get("state"),
            error: get("error"),
            error_description: get("error_description"),
        })
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Turns the callback into an exchangeable request.
    /// A callback carrying `error` (e.g. the user declined consent) or no code is rejected.
    pub fn into_request(
        self,
        provider: ProviderId,
        redirect_uri: &str,
    ) -> Result<AuthorizationRequest, Error> {
        if let Some(err) = self.error {
            let cause = match self.error_description {
                Some(desc) => format!("{err}: {desc}"),
                None => err,
            };
            return Err(Error::Exchange { provider, cause });
        }
        let code = self.code.ok_or_else(|| Error::Exchange {
            provider,
            cause: "callback carries no authorization code".to_string(),
        })?;
        let req = AuthorizationRequest::new(provider, code, redirect_uri);
        Ok(match self.state {
            Some(state) => req.with_state(&state),
            None => req,
        })
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use url::Url;

    use super::{AuthUrlRequest, AuthorizationRequest, CallbackParams};
    use crate::{config::ProviderConfig, error::Error, provider::ProviderId};

    fn config(provider: ProviderId) -> ProviderConfig {
        ProviderConfig::builder(provider)
            .client_id("my_client_id")
            .client_secret("my_secret")
            .redirect_uri("https://redirect.example.com/callback")
            .build()
            .unwrap()
    }

    fn count_key(url: &str, key: &str) -> usize {
        Url::parse(url)
            .unwrap()
            .query_pairs()
            .filter(|(k, _)| k == key)
            .count()
    }

    #[test]
    fn test_auth_url_kakao() {
        let url = AuthUrlRequest::new(&config(ProviderId::Kakao), "xyz")
            .into_url()
            .unwrap();
        let expected = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&state=xyz",
            "https://kauth.kakao.com/oauth/authorize",
            "my_client_id",
            "https%3A%2F%2Fredirect.example.com%2Fcallback",
        );
        assert_eq!(url, expected);
    }

    #[test]
    fn test_auth_url_google_scope() {
        let url = AuthUrlRequest::new(&config(ProviderId::Google), "xyz")
            .into_url()
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let scope = parsed
            .query_pairs()
            .find(|(k, _)| k == "scope")
            .map(|(_, v)| v.to_string());
        assert_eq!(scope.as_deref(), Some("openid profile email"));
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    }

    #[test]
    fn test_auth_url_scope_duplicate() {
        let config = ProviderConfig::builder(ProviderId::Google)
            .client_id("my_client_id")
            .client_secret("my_secret")
            .redirect_uri("https://redirect.example.com/callback")
            .scope(["openid", "email", "openid"])
            .build()
            .unwrap();
        let url = AuthUrlRequest::new(&config, "s").into_url().unwrap();
        assert!(url.contains("scope=openid+email&"));
    }

    #[test]
    fn test_auth_url_required_params_once_for_all_providers() {
        for provider in ProviderId::ALL {
            let url = AuthUrlRequest::new(&config(provider), "st")
                .into_url()
                .unwrap();
            assert_eq!(count_key(&url, "client_id"), 1, "{provider}");
            assert_eq!(count_key(&url, "redirect_uri"), 1, "{provider}");
            assert_eq!(url.matches("response_type=code").count(), 1, "{provider}");
            assert_eq!(count_key(&url, "state"), 1, "{provider}");
        }
    }

    #[test]
    fn test_callback_into_request() {
        let params =
            CallbackParams::from_url("https://app.example.com/cb?code=abc123&state=st").unwrap();
        assert_eq!(params.code(), Some("abc123"));
        let req = params
            .into_request(ProviderId::Naver, "https://app.example.com/cb")
            .unwrap();
        assert_eq!(
            req,
            AuthorizationRequest::new(ProviderId::Naver, "abc123", "https://app.example.com/cb")
                .with_state("st")
        );
    }

    #[test]
    fn test_callback_with_error() {
        let params = CallbackParams::from_url(
            "https://app.example.com/cb?error=access_denied&error_description=User%20denied",
        )
        .unwrap();
        let res = params.into_request(ProviderId::Kakao, "https://app.example.com/cb");
        assert_eq!(
            res.unwrap_err(),
            Error::Exchange {
                provider: ProviderId::Kakao,
                cause: "access_denied: User denied".to_string()
            }
        );
    }

    #[test]
    fn test_callback_without_code() {
        let params = CallbackParams::from_url("https://app.example.com/cb?state=st").unwrap();
        let res = params.into_request(ProviderId::Google, "https://app.example.com/cb");
        assert!(matches!(res, Err(Error::Exchange { .. })));
    }

    #[test]
    fn test_callback_bad_url() {
        assert!(CallbackParams::from_url("not a url").is_err());
    }
}
