//! Identifies the supported identity providers and the few facts that differ between them.
//!
//! Everything provider-specific that is not a credential lives here: well-known endpoints,
//! default scopes, how the token request is put on the wire, and where the profile sits
//! inside the user-info body. The rest of the crate branches on these values instead of
//! carrying one copy of the flow per provider.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Kakao,
    Naver,
    Google,
}

/// How a provider expects the authorization-code exchange to be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRequestShape {
    /// `POST` with an `application/x-www-form-urlencoded` body.
    PostForm,
    /// `GET` with every parameter in the query string.
    GetQuery,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::Kakao, ProviderId::Naver, ProviderId::Google];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Kakao => "kakao",
            ProviderId::Naver => "naver",
            ProviderId::Google => "google",
        }
    }

    /// Prefix of the environment variables holding this provider's settings.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            ProviderId::Kakao => "KAKAO",
            ProviderId::Naver => "NAVER",
            ProviderId::Google => "GOOGLE",
        }
    }

    pub fn authorize_endpoint(&self) -> &'static str {
        match self {
            ProviderId::Kakao => "https://kauth.kakao.com/oauth/authorize",
            ProviderId::Naver => "https://nid.naver.com/oauth2.0/authorize",
            ProviderId::Google => "https://accounts.google.com/o/oauth2/v2/auth",
        }
    }

    pub fn token_endpoint(&self) -> &'static str {
        match self {
            ProviderId::Kakao => "https://kauth.kakao.com/oauth/token",
            ProviderId::Naver => "https://nid.naver.com/oauth2.0/token",
            ProviderId::Google => "https://oauth2.googleapis.com/token",
        }
    }

    pub fn user_info_endpoint(&self) -> &'static str {
        match self {
            ProviderId::Kakao => "https://kapi.kakao.com/v2/user/me",
            ProviderId::Naver => "https://openapi.naver.com/v1/nid/me",
            ProviderId::Google => "https://openidconnect.googleapis.com/v1/userinfo",
        }
    }

    pub fn default_scope(&self) -> &'static [&'static str] {
        match self {
            ProviderId::Kakao | ProviderId::Naver => &[],
            ProviderId::Google => &["openid", "profile", "email"],
        }
    }

    pub fn token_request_shape(&self) -> TokenRequestShape {
        match self {
            ProviderId::Kakao | ProviderId::Google => TokenRequestShape::PostForm,
            ProviderId::Naver => TokenRequestShape::GetQuery,
        }
    }

    /// Naver and Google refuse confidential exchanges without a secret; Kakao makes it optional.
    pub fn requires_client_secret(&self) -> bool {
        !matches!(self, ProviderId::Kakao)
    }

    /// Naver's token endpoint does not take `redirect_uri`, it takes `state` instead.
    pub fn sends_redirect_uri_on_exchange(&self) -> bool {
        !matches!(self, ProviderId::Naver)
    }

    pub fn sends_state_on_exchange(&self) -> bool {
        matches!(self, ProviderId::Naver)
    }

    /// Key under which the user-info body nests the actual profile, if any.
    pub fn profile_envelope(&self) -> Option<&'static str> {
        match self {
            ProviderId::Naver => Some("response"),
            ProviderId::Kakao | ProviderId::Google => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "kakao" => Ok(ProviderId::Kakao),
            "naver" => Ok(ProviderId::Naver),
            "google" => Ok(ProviderId::Google),
            _ => Err(Error::UnknownProvider(s.to_string())),
        }
    }
}
