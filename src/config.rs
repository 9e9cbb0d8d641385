//! Defines structures and builders related to provider configuration.
//!
//! Provides a structured way to handle the credentials and endpoints
//! required for the authorization-code flow of each provider.
//!
//! ## Structures
//! - `ProviderConfig`: Stores everything needed to talk to one provider.
//! - `ProviderConfigBuilder`: A builder for constructing a `ProviderConfig` instance.
//! - `ProviderRegistry`: The immutable table of configured providers.
//!
//! # Example
//! ```rust,no_run
//! use social_oauth::{config::ProviderConfig, provider::ProviderId};
//!
//! let config = ProviderConfig::builder(ProviderId::Kakao)
//!     .client_id("your-client-id")
//!     .client_secret("your-client-secret")
//!     .redirect_uri("https://your-app.com/callback")
//!     .build()
//!     .unwrap();
//! ```
//!
//! The builder starts from the provider's well-known endpoints, so only
//! credentials and the redirect URI are mandatory.
use std::{collections::HashMap, fmt, time::Duration};

use tracing::{info, warn};
use url::Url;

use crate::{
    error::{ConfigError, Error},
    provider::{ProviderId, TokenRequestShape},
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AuthEndPoint(pub String);

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ClientID(pub String);

/// Never printed by `Debug`.
#[derive(Clone, Default, PartialEq)]
pub(crate) struct ClientSecret(pub String);

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("ClientSecret(<none>)")
        } else {
            f.write_str("ClientSecret(<redacted>)")
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct TokenEndPoint(pub String);

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct UserInfoEndPoint(pub String);

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RedirectURI(pub String);

/// Holds all information required to run the authorization-code flow against one provider.
///
/// It is immutable once constructed; build it with [`ProviderConfig::builder`]
/// or [`ProviderConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub(crate) provider: ProviderId,
    pub(crate) client_id: ClientID,
    pub(crate) client_secret: ClientSecret,
    pub(crate) redirect_uri: RedirectURI,
    pub(crate) auth_endpoint: AuthEndPoint,
    pub(crate) token_endpoint: TokenEndPoint,
    pub(crate) user_info_endpoint: UserInfoEndPoint,
    pub(crate) scope: Vec<String>,
    pub(crate) timeout: Duration,
}

// ==========impl ProviderConfig==========
impl ProviderConfig {
    /// Returns a builder pre-filled with the provider's well-known endpoints and scope.
    pub fn builder(provider: ProviderId) -> ProviderConfigBuilder {
        ProviderConfigBuilder::new(provider)
    }

    /// Reads the provider's settings from the process environment.
    ///
    /// Variables are prefixed with the provider name, e.g. `KAKAO_CLIENT_ID`,
    /// `KAKAO_CLIENT_SECRET`, `KAKAO_REDIRECT_URI`. Endpoint, scope and timeout
    /// overrides are optional (`_AUTHORIZE_URI`, `_TOKEN_URI`, `_USER_INFO_URI`,
    /// `_SCOPE`, `_TIMEOUT_SECS`).
    pub fn from_env(provider: ProviderId) -> Result<Self, ConfigError> {
        Self::from_lookup(provider, |key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(provider: ProviderId, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = provider.env_prefix();
        let var = |name: &str| lookup(&format!("{prefix}_{name}"));

        let mut builder = ProviderConfigBuilder::new(provider);
        if let Some(v) = var("CLIENT_ID") {
            builder = builder.client_id(&v);
        }
        if let Some(v) = var("CLIENT_SECRET") {
            builder = builder.client_secret(&v);
        }
        if let Some(v) = var("REDIRECT_URI") {
            builder = builder.redirect_uri(&v);
        }
        if let Some(v) = var("AUTHORIZE_URI") {
            builder = builder.auth_endpoint(&v);
        }
        if let Some(v) = var("TOKEN_URI") {
            builder = builder.token_endpoint(&v);
        }
        if let Some(v) = var("USER_INFO_URI") {
            builder = builder.user_info_endpoint(&v);
        }
        if let Some(v) = var("SCOPE") {
            builder = builder.scope(v.split_whitespace());
        }
        if let Some(v) = var("TIMEOUT_SECS") {
            let secs = v.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                var: format!("{prefix}_TIMEOUT_SECS"),
                cause: e.to_string(),
            })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn client_id(&self) -> &str {
        &self.client_id.0
    }

    /// `None` for public clients.
    pub fn client_secret(&self) -> Option<&str> {
        if self.client_secret.0.is_empty() {
            None
        } else {
            Some(&self.client_secret.0)
        }
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri.0
    }

    pub fn auth_endpoint(&self) -> &str {
        &self.auth_endpoint.0
    }

    pub fn token_endpoint(&self) -> &str {
        &self.token_endpoint.0
    }

    pub fn user_info_endpoint(&self) -> &str {
        &self.user_info_endpoint.0
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn token_request_shape(&self) -> TokenRequestShape {
        self.provider.token_request_shape()
    }
}

/// Provides a convenient way to create a `ProviderConfig` instance step by step.
///
/// # Example
/// ```rust,no_run
/// use social_oauth::{config::ProviderConfigBuilder, provider::ProviderId};
///
/// let builder = ProviderConfigBuilder::new(ProviderId::Naver)
///     .client_id("your-client-id")
///     .client_secret("your-client-secret")
///     .redirect_uri("https://your-app.com/callback");
///
/// let config = builder.build().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ProviderConfigBuilder {
    provider: ProviderId,
    client_id: ClientID,
    client_secret: ClientSecret,
    redirect_uri: RedirectURI,
    auth_endpoint: AuthEndPoint,
    token_endpoint: TokenEndPoint,
    user_info_endpoint: UserInfoEndPoint,
    scope: Vec<String>,
    timeout: Duration,
}

// ==========impl ProviderConfigBuilder==========
impl ProviderConfigBuilder {
    pub fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            client_id: ClientID::default(),
            client_secret: ClientSecret::default(),
            redirect_uri: RedirectURI::default(),
            auth_endpoint: AuthEndPoint(provider.authorize_endpoint().to_string()),
            token_endpoint: TokenEndPoint(provider.token_endpoint().to_string()),
            user_info_endpoint: UserInfoEndPoint(provider.user_info_endpoint().to_string()),
            scope: provider
                .default_scope()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the client ID issued by the provider's developer console.
    pub fn client_id(mut self, client_id: &str) -> Self {
        self.client_id = ClientID(client_id.trim().to_string());
        self
    }

    /// Sets the client secret. An empty value means a public client.
    pub fn client_secret(mut self, client_secret: &str) -> Self {
        self.client_secret = ClientSecret(client_secret.trim().to_string());
        self
    }

    /// Sets the redirect URI registered with the provider.
    pub fn redirect_uri(mut self, redirect_uri: &str) -> Self {
        self.redirect_uri = RedirectURI(redirect_uri.trim().to_string());
        self
    }

    pub fn auth_endpoint(mut self, auth_endpoint: &str) -> Self {
        self.auth_endpoint = AuthEndPoint(auth_endpoint.trim().to_string());
        self
    }

    pub fn token_endpoint(mut self, token_endpoint: &str) -> Self {
        self.token_endpoint = TokenEndPoint(token_endpoint.trim().to_string());
        self
    }

    pub fn user_info_endpoint(mut self, user_info_endpoint: &str) -> Self {
        self.user_info_endpoint = UserInfoEndPoint(user_info_endpoint.trim().to_string());
        self
    }

    /// Replaces the provider's default scope.
    pub fn scope<I, S>(mut self, scope: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scope = scope
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        self
    }

    /// Per-request timeout for the token and user-info calls.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates the collected values and constructs a `ProviderConfig`.
    pub fn build(self) -> Result<ProviderConfig, ConfigError> {
        let provider = self.provider;
        if self.client_id.0.is_empty() {
            return Err(ConfigError::MissingField {
                provider,
                field: "client_id",
            });
        }
        if self.redirect_uri.0.is_empty() {
            return Err(ConfigError::MissingField {
                provider,
                field: "redirect_uri",
            });
        }
        if provider.requires_client_secret() && self.client_secret.0.is_empty() {
            return Err(ConfigError::MissingSecret { provider });
        }
        check_url(provider, "redirect_uri", &self.redirect_uri.0)?;
        check_url(provider, "authorize_endpoint", &self.auth_endpoint.0)?;
        check_url(provider, "token_endpoint", &self.token_endpoint.0)?;
        check_url(provider, "user_info_endpoint", &self.user_info_endpoint.0)?;

        Ok(ProviderConfig {
            provider,
            client_id: self.client_id,
            client_secret: self.client_secret,
            redirect_uri: self.redirect_uri,
            auth_endpoint: self.auth_endpoint,
            token_endpoint: self.token_endpoint,
            user_info_endpoint: self.user_info_endpoint,
            scope: self.scope,
            timeout: self.timeout,
        })
    }
}

fn check_url(provider: ProviderId, field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::MissingField { provider, field });
    }
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl {
            provider,
            field,
            cause: e.to_string(),
        })
}

/// The read-only table of configured providers, keyed by `ProviderId`.
///
/// Built once at startup and shared (usually behind an `Arc`) by every
/// authentication attempt.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    configs: HashMap<ProviderId, ProviderConfig>,
}

impl ProviderRegistry {
    pub fn new<I>(configs: I) -> Self
    where
        I: IntoIterator<Item = ProviderConfig>,
    {
        Self {
            configs: configs.into_iter().map(|c| (c.provider, c)).collect(),
        }
    }

    /// Loads every provider from the environment.
    /// A provider whose configuration is incomplete is logged and left out.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut configs = HashMap::new();
        for provider in ProviderId::ALL {
            match ProviderConfig::from_lookup(provider, &lookup) {
                Ok(config) => {
                    info!(%provider, "provider configured");
                    configs.insert(provider, config);
                }
                Err(e) => warn!(%provider, "provider disabled: {}", e),
            }
        }
        Self { configs }
    }

    pub fn get(&self, provider: ProviderId) -> Result<&ProviderConfig, Error> {
        self.configs
            .get(&provider)
            .ok_or_else(|| Error::UnknownProvider(provider.to_string()))
    }

    /// Providers that can be offered to users, in a stable order.
    pub fn providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|p| self.configs.contains_key(p))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use super::{ProviderConfig, ProviderConfigBuilder, ProviderRegistry};
    use crate::{
        error::{ConfigError, Error},
        provider::ProviderId,
    };

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_builder() {
        let config = ProviderConfigBuilder::new(ProviderId::Kakao)
            .client_id("my_client_id")
            .client_secret("my_secret")
            .redirect_uri("https://redirect.example.com")
            .token_endpoint("https://token.example.com")
            .build()
            .unwrap();

        assert_eq!(config.client_id.0, "my_client_id");
        assert_eq!(config.client_secret(), Some("my_secret"));
        assert_eq!(config.redirect_uri.0, "https://redirect.example.com");
        assert_eq!(config.token_endpoint.0, "https://token.example.com");
        assert_eq!(
            config.auth_endpoint.0,
            "https://kauth.kakao.com/oauth/authorize"
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_builder_defaults_per_provider() {
        let google = ProviderConfig::builder(ProviderId::Google)
            .client_id("id")
            .client_secret("secret")
            .redirect_uri("https://redirect.example.com")
            .build()
            .unwrap();
        assert_eq!(google.scope(), ["openid", "profile", "email"]);
        assert_eq!(
            google.user_info_endpoint(),
            "https://openidconnect.googleapis.com/v1/userinfo"
        );

        let naver = ProviderConfig::builder(ProviderId::Naver)
            .client_id("id")
            .client_secret("secret")
            .redirect_uri("https://redirect.example.com")
            .build()
            .unwrap();
        assert!(naver.scope().is_empty());
        assert_eq!(naver.token_endpoint(), "https://nid.naver.com/oauth2.0/token");
    }

    #[test]
    fn test_config_kakao_secret_optional() {
        let config = ProviderConfig::builder(ProviderId::Kakao)
            .client_id("id")
            .redirect_uri("https://redirect.example.com")
            .build()
            .unwrap();
        assert_eq!(config.client_secret(), None);
    }

    #[test]
    fn test_config_missing_fields() {
        let res = ProviderConfig::builder(ProviderId::Kakao)
            .redirect_uri("https://redirect.example.com")
            .build();
        assert_eq!(
            res.unwrap_err(),
            ConfigError::MissingField {
                provider: ProviderId::Kakao,
                field: "client_id"
            }
        );

        let res = ProviderConfig::builder(ProviderId::Naver)
            .client_id("id")
            .redirect_uri("https://redirect.example.com")
            .build();
        assert_eq!(
            res.unwrap_err(),
            ConfigError::MissingSecret {
                provider: ProviderId::Naver
            }
        );
    }

    #[test]
    fn test_config_invalid_endpoint() {
        let res = ProviderConfig::builder(ProviderId::Kakao)
            .client_id("id")
            .redirect_uri("https://redirect.example.com")
            .token_endpoint("not a url")
            .build();
        assert!(matches!(
            res,
            Err(ConfigError::InvalidUrl {
                field: "token_endpoint",
                ..
            })
        ));
    }

    #[test]
    fn test_secret_is_not_debug_printed() {
        let config = ProviderConfig::builder(ProviderId::Naver)
            .client_id("id")
            .client_secret("super-secret-value")
            .redirect_uri("https://redirect.example.com")
            .build()
            .unwrap();
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-value"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_config_from_lookup() {
        let config = ProviderConfig::from_lookup(
            ProviderId::Google,
            lookup(&[
                ("GOOGLE_CLIENT_ID", "gid"),
                ("GOOGLE_CLIENT_SECRET", "gsecret"),
                ("GOOGLE_REDIRECT_URI", "https://app.example.com/google"),
                ("GOOGLE_SCOPE", "openid email"),
                ("GOOGLE_TIMEOUT_SECS", "2"),
            ]),
        )
        .unwrap();
        assert_eq!(config.client_id(), "gid");
        assert_eq!(config.scope(), ["openid", "email"]);
        assert_eq!(config.timeout(), Duration::from_secs(2));
        assert_eq!(config.token_endpoint(), "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_config_from_lookup_bad_timeout() {
        let res = ProviderConfig::from_lookup(
            ProviderId::Kakao,
            lookup(&[
                ("KAKAO_CLIENT_ID", "kid"),
                ("KAKAO_REDIRECT_URI", "https://app.example.com/kakao"),
                ("KAKAO_TIMEOUT_SECS", "soon"),
            ]),
        );
        assert!(matches!(res, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_registry_skips_broken_providers() {
        let registry = ProviderRegistry::from_lookup(lookup(&[
            ("KAKAO_CLIENT_ID", "kid"),
            ("KAKAO_REDIRECT_URI", "https://app.example.com/kakao"),
            // secret missing, so naver is not offered
            ("NAVER_CLIENT_ID", "nid"),
            ("NAVER_REDIRECT_URI", "https://app.example.com/naver"),
        ]));
        assert_eq!(registry.providers(), vec![ProviderId::Kakao]);
        assert!(registry.get(ProviderId::Kakao).is_ok());
        assert_eq!(
            registry.get(ProviderId::Naver).unwrap_err(),
            Error::UnknownProvider("naver".to_string())
        );
    }
}
