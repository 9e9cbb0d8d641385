//! OAuth2 authorization-code login for Kakao, Naver and Google.
//!
//! This library turns an authorization code from any of the supported providers into one
//! normalized [`ExternalIdentity`](identity::ExternalIdentity), hiding how differently the
//! providers shape their token requests and profile responses.
//! # Feature
//! - Build the provider's authorization URL (caller supplies `state`)
//! - Generate a random `state` value
//! - Parse the provider's callback
//! - Exchange the code for tokens (form `POST` or query `GET`, per provider, using reqwest)
//! - Fetch the user profile with the access token, unwrapping provider envelopes
//! - Normalize the profile into a provider-independent identity
//! - Retry transport failures that never reached the provider, never a rejected code
//! # Caution
//! - `state` is carried, not validated. Compare it with the stored value yourself.
//! - Nothing here issues sessions or stores users; do that with the returned identity.
//! - Show [`AuthError::user_message`](error::AuthError::user_message) to end users, not the error itself.
//! # Examples
//! For example usage, see `demos/login_cli.rs`.
pub mod code;
pub mod config;
pub mod error;
pub mod executer;
pub mod identity;
pub mod orchestrator;
pub mod profile;
pub mod provider;
pub mod response;
pub mod state;
pub mod token;

#[cfg(test)]
pub(crate) mod test_support;
