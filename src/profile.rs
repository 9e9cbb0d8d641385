//! The user-info request and the raw profile it returns.
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{config::ProviderConfig, error::Error, provider::ProviderId, token::AccessToken};

/// The provider's profile object, as returned, after any envelope has been removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawProfile(pub(crate) Map<String, Value>);

impl RawProfile {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Follows a `.`-separated path through nested objects, e.g. `kakao_account.email`.
    pub fn pointer(&self, path: &str) -> Option<&Value> {
        let mut keys = path.split('.');
        let first = self.0.get(keys.next()?)?;
        keys.try_fold(first, |value, key| value.get(key))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Removes the provider's envelope from a user-info body.
    ///
    /// Naver wraps the profile as `{"resultcode": "00", "message": "success", "response": {...}}`;
    /// any other result code, or a missing `response` object, is a failed fetch.
    pub(crate) fn from_body(provider: ProviderId, body: Value) -> Result<Self, Error> {
        let Value::Object(mut map) = body else {
            return Err(Error::UserInfo {
                provider,
                cause: "user info body is not a JSON object".to_string(),
            });
        };
        let Some(envelope) = provider.profile_envelope() else {
            return Ok(Self(map));
        };

        if let Some(code) = map.get("resultcode").and_then(Value::as_str) {
            if code != "00" {
                let message = map
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error");
                return Err(Error::UserInfo {
                    provider,
                    cause: format!("resultcode {code}: {message}"),
                });
            }
        }
        match map.remove(envelope) {
            Some(Value::Object(inner)) => Ok(Self(inner)),
            _ => Err(Error::UserInfo {
                provider,
                cause: format!("user info body has no `{envelope}` object"),
            }),
        }
    }
}

impl From<Map<String, Value>> for RawProfile {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

/// A structure used to call the provider's user-info endpoint with a bearer token.
#[derive(Debug, Clone)]
pub struct UserInfoRequest {
    provider: ProviderId,
    user_info_endpoint: String,
    access_token: AccessToken,
    timeout: Duration,
}

impl UserInfoRequest {
    pub fn new(config: &ProviderConfig, access_token: &AccessToken) -> Self {
        Self {
            provider: config.provider,
            user_info_endpoint: config.user_info_endpoint.0.clone(),
            access_token: access_token.clone(),
            timeout: config.timeout,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn user_info_endpoint(&self) -> &str {
        &self.user_info_endpoint
    }

    pub fn access_token(&self) -> &AccessToken {
        &self.access_token
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::RawProfile;
    use crate::{error::Error, provider::ProviderId};

    #[test]
    fn test_kakao_body_is_profile() {
        let profile = RawProfile::from_body(
            ProviderId::Kakao,
            json!({"id": 987, "kakao_account": {"email": "a@b.com"}}),
        )
        .unwrap();
        assert_eq!(profile.get("id"), Some(&json!(987)));
        assert_eq!(profile.pointer("kakao_account.email"), Some(&json!("a@b.com")));
        assert_eq!(profile.pointer("kakao_account.profile.nickname"), None);
    }

    #[test]
    fn test_naver_envelope_is_removed() {
        let profile = RawProfile::from_body(
            ProviderId::Naver,
            json!({
                "resultcode": "00",
                "message": "success",
                "response": {"id": "naver-1", "email": "n@example.com"}
            }),
        )
        .unwrap();
        assert_eq!(profile.get("id"), Some(&json!("naver-1")));
        assert_eq!(profile.get("resultcode"), None);
    }

    #[test]
    fn test_naver_failed_resultcode() {
        let res = RawProfile::from_body(
            ProviderId::Naver,
            json!({"resultcode": "024", "message": "Authentication failed"}),
        );
        assert_eq!(
            res.unwrap_err(),
            Error::UserInfo {
                provider: ProviderId::Naver,
                cause: "resultcode 024: Authentication failed".to_string()
            }
        );
    }

    #[test]
    fn test_naver_missing_envelope() {
        let res = RawProfile::from_body(ProviderId::Naver, json!({"id": "x"}));
        assert!(matches!(res, Err(Error::UserInfo { .. })));
    }

    #[test]
    fn test_non_object_body() {
        let res = RawProfile::from_body(ProviderId::Google, json!(["sub"]));
        assert!(matches!(res, Err(Error::UserInfo { .. })));
    }
}
