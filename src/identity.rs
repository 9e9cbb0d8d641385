//! Maps each provider's profile into one canonical `ExternalIdentity`.
//!
//! Field locations per provider:
//!
//! | Provider | subject | email | display name |
//! |---|---|---|---|
//! | Kakao | `id` | `kakao_account.email` | `kakao_account.profile.nickname`, `properties.nickname` |
//! | Naver | `id` | `email` | `name`, `nickname` |
//! | Google | `sub` | `email` | `name` |
//!
//! Only the subject is mandatory. Email and display name are best effort.
use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::{error::Error, profile::RawProfile, provider::ProviderId};

/// The normalized result of a login, identical in shape for every provider.
///
/// `provider_user_id` is never empty and is the only field identity linking may rely on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIdentity {
    provider: ProviderId,
    provider_user_id: String,
    display_name: Option<String>,
    email: Option<String>,
    /// Kept for audit only.
    raw_profile: RawProfile,
    success: bool,
}

impl ExternalIdentity {
    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn provider_user_id(&self) -> &str {
        &self.provider_user_id
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn raw_profile(&self) -> &RawProfile {
        &self.raw_profile
    }

    pub fn success(&self) -> bool {
        self.success
    }
}

/// Where a provider keeps the fields that make up an identity.
pub trait ProfileExtractor: Send + Sync {
    /// Dotted path of the mandatory subject identifier.
    fn subject_path(&self) -> &'static str;
    /// Candidate paths for the email, first match wins.
    fn email_paths(&self) -> &'static [&'static str];
    /// Candidate paths for the display name, first match wins.
    fn display_name_paths(&self) -> &'static [&'static str];

    fn subject(&self, profile: &RawProfile) -> Option<String> {
        profile.pointer(self.subject_path()).and_then(scalar)
    }

    fn email(&self, profile: &RawProfile) -> Option<String> {
        first_match(profile, self.email_paths())
    }

    fn display_name(&self, profile: &RawProfile) -> Option<String> {
        first_match(profile, self.display_name_paths())
    }
}

pub struct KakaoProfile;

impl ProfileExtractor for KakaoProfile {
    fn subject_path(&self) -> &'static str {
        "id"
    }

    fn email_paths(&self) -> &'static [&'static str] {
        &["kakao_account.email"]
    }

    fn display_name_paths(&self) -> &'static [&'static str] {
        &["kakao_account.profile.nickname", "properties.nickname"]
    }
}

pub struct NaverProfile;

impl ProfileExtractor for NaverProfile {
    fn subject_path(&self) -> &'static str {
        "id"
    }

    fn email_paths(&self) -> &'static [&'static str] {
        &["email"]
    }

    fn display_name_paths(&self) -> &'static [&'static str] {
        &["name", "nickname"]
    }
}

pub struct GoogleProfile;

impl ProfileExtractor for GoogleProfile {
    fn subject_path(&self) -> &'static str {
        "sub"
    }

    fn email_paths(&self) -> &'static [&'static str] {
        &["email"]
    }

    fn display_name_paths(&self) -> &'static [&'static str] {
        &["name"]
    }
}

pub fn extractor_for(provider: ProviderId) -> &'static dyn ProfileExtractor {
    match provider {
        ProviderId::Kakao => &KakaoProfile,
        ProviderId::Naver => &NaverProfile,
        ProviderId::Google => &GoogleProfile,
    }
}

/// Builds the canonical identity, failing only when the subject identifier is absent.
pub fn normalize(provider: ProviderId, raw_profile: RawProfile) -> Result<ExternalIdentity, Error> {
    let extractor = extractor_for(provider);
    let Some(provider_user_id) = extractor.subject(&raw_profile) else {
        error!(
            %provider,
            field = extractor.subject_path(),
            "provider contract violation: profile has no subject identifier"
        );
        return Err(Error::Normalization {
            provider,
            missing_field: extractor.subject_path(),
        });
    };

    Ok(ExternalIdentity {
        provider,
        display_name: extractor.display_name(&raw_profile),
        email: extractor.email(&raw_profile),
        provider_user_id,
        raw_profile,
        success: true,
    })
}

fn first_match(profile: &RawProfile, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| profile.pointer(path).and_then(scalar))
}

/// Kakao ids are JSON numbers; everything else arrives as strings.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ==========Tests==========
#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::normalize;
    use crate::{error::Error, profile::RawProfile, provider::ProviderId};

    fn raw(value: Value) -> RawProfile {
        match value {
            Value::Object(map) => RawProfile::from(map),
            _ => panic!("profile must be an object"),
        }
    }

    #[test]
    fn test_normalize_kakao() {
        let identity = normalize(
            ProviderId::Kakao,
            raw(json!({
                "id": 987,
                "kakao_account": {
                    "email": "a@b.com",
                    "profile": {"nickname": "Ryan"}
                }
            })),
        )
        .unwrap();
        assert_eq!(identity.provider(), ProviderId::Kakao);
        assert_eq!(identity.provider_user_id(), "987");
        assert_eq!(identity.email(), Some("a@b.com"));
        assert_eq!(identity.display_name(), Some("Ryan"));
        assert!(identity.success());
    }

    #[test]
    fn test_normalize_kakao_nickname_fallback() {
        let identity = normalize(
            ProviderId::Kakao,
            raw(json!({"id": 1, "properties": {"nickname": "Apeach"}})),
        )
        .unwrap();
        assert_eq!(identity.display_name(), Some("Apeach"));
        assert_eq!(identity.email(), None);
    }

    #[test]
    fn test_normalize_naver() {
        let identity = normalize(
            ProviderId::Naver,
            raw(json!({"id": "32742776", "email": "n@naver.com", "name": "Kim"})),
        )
        .unwrap();
        assert_eq!(identity.provider_user_id(), "32742776");
        assert_eq!(identity.email(), Some("n@naver.com"));
        assert_eq!(identity.display_name(), Some("Kim"));
    }

    #[test]
    fn test_normalize_google() {
        let identity = normalize(
            ProviderId::Google,
            raw(json!({"sub": "1100234", "email": "g@gmail.com", "name": "Lee", "id": "other"})),
        )
        .unwrap();
        assert_eq!(identity.provider_user_id(), "1100234");
        assert_eq!(identity.display_name(), Some("Lee"));
    }

    #[test]
    fn test_normalize_missing_subject_for_every_provider() {
        for (provider, field) in [
            (ProviderId::Kakao, "id"),
            (ProviderId::Naver, "id"),
            (ProviderId::Google, "sub"),
        ] {
            let res = normalize(provider, raw(json!({"email": "x@y.z"})));
            assert_eq!(
                res.unwrap_err(),
                Error::Normalization {
                    provider,
                    missing_field: field
                }
            );
        }
    }

    #[test]
    fn test_normalize_rejects_empty_subject() {
        let res = normalize(ProviderId::Naver, raw(json!({"id": "  "})));
        assert!(matches!(res, Err(Error::Normalization { .. })));
        let res = normalize(ProviderId::Google, raw(json!({"sub": null})));
        assert!(matches!(res, Err(Error::Normalization { .. })));
    }

    #[test]
    fn test_identity_serializes_camel_case() {
        let identity = normalize(ProviderId::Kakao, raw(json!({"id": 5}))).unwrap();
        let value = serde_json::to_value(&identity).unwrap();
        assert_eq!(value["providerUserId"], json!("5"));
        assert_eq!(value["provider"], json!("kakao"));
        assert_eq!(value["rawProfile"], json!({"id": 5}));
        assert_eq!(value["success"], json!(true));
    }
}
