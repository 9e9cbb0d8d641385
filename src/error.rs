//! Error types shared by every stage of a login attempt.
//!
//! - `ConfigError`: a provider's configuration is missing or malformed.
//! - `Error`: what a single component (exchange, user-info, normalizer) reports.
//! - `AuthError`: what `OAuthOrchestrator` hands back to its caller.
use std::fmt;

use thiserror::Error;

use crate::provider::ProviderId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{provider}: required field `{field}` is missing")]
    MissingField {
        provider: ProviderId,
        field: &'static str,
    },
    #[error("{provider}: `{field}` is not a valid url: {cause}")]
    InvalidUrl {
        provider: ProviderId,
        field: &'static str,
        cause: String,
    },
    #[error("{provider}: provider is not configured")]
    NotConfigured { provider: ProviderId },
    #[error("{provider}: client secret is required for this provider")]
    MissingSecret { provider: ProviderId },
    #[error("environment variable `{var}` is invalid: {cause}")]
    InvalidValue { var: String, cause: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("unknown provider `{0}`")]
    UnknownProvider(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// No usable HTTP response. `retryable` is false once the provider answered.
    #[error("{provider}: transport failure: {cause}")]
    Transport {
        provider: ProviderId,
        cause: String,
        retryable: bool,
    },
    #[error("{provider}: token exchange rejected: {cause}")]
    Exchange { provider: ProviderId, cause: String },
    #[error("{provider}: user info request failed: {cause}")]
    UserInfo { provider: ProviderId, cause: String },
    #[error("{provider}: profile is missing `{missing_field}`")]
    Normalization {
        provider: ProviderId,
        missing_field: &'static str,
    },
}

impl Error {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transport { retryable: true, .. })
    }
}

/// The stage at which an authentication attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    Config,
    UnknownProvider,
    ExchangeFailed,
    ProfileFetchFailed,
    NormalizationFailed,
}

impl fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthErrorKind::Config => "ConfigError",
            AuthErrorKind::UnknownProvider => "UnknownProvider",
            AuthErrorKind::ExchangeFailed => "ExchangeFailed",
            AuthErrorKind::ProfileFetchFailed => "ProfileFetchFailed",
            AuthErrorKind::NormalizationFailed => "NormalizationFailed",
        };
        f.write_str(s)
    }
}

/// Terminal failure of `OAuthOrchestrator::authenticate`.
///
/// `Display` carries the full cause and is meant for internal diagnostics.
/// Use [`AuthError::user_message`] for anything shown to an end user.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} ({provider}): {cause}")]
pub struct AuthError {
    pub kind: AuthErrorKind,
    pub provider: ProviderId,
    #[source]
    pub cause: Error,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, provider: ProviderId, cause: Error) -> Self {
        Self {
            kind,
            provider,
            cause,
        }
    }

    pub fn user_message(&self) -> &'static str {
        "login failed, try again"
    }
}
