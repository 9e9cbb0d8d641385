//! The caller-facing summary of a login attempt.
//!
//! Meant to be serialized straight into an HTTP response body. Failures carry only
//! a generic message; the diagnostic detail of `AuthError` stays in the logs.
use serde::Serialize;

use crate::{error::AuthError, identity::ExternalIdentity, provider::ProviderId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub provider: ProviderId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl LoginResponse {
    pub fn from_result(result: &Result<ExternalIdentity, AuthError>) -> Self {
        match result {
            Ok(identity) => Self::from(identity),
            Err(err) => Self::from(err),
        }
    }
}

impl From<&ExternalIdentity> for LoginResponse {
    fn from(identity: &ExternalIdentity) -> Self {
        Self {
            success: true,
            message: format!("{} login succeeded", identity.provider()),
            provider: identity.provider(),
            provider_user_id: Some(identity.provider_user_id().to_string()),
            display_name: identity.display_name().map(str::to_string),
            email: identity.email().map(str::to_string),
        }
    }
}

impl From<&AuthError> for LoginResponse {
    fn from(err: &AuthError) -> Self {
        Self {
            success: false,
            message: err.user_message().to_string(),
            provider: err.provider,
            provider_user_id: None,
            display_name: None,
            email: None,
        }
    }
}
