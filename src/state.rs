//! Provides a random `state` value for authorization requests.
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};
use thiserror::Error;
use tracing::error;

/// A randomly generated `state` created using `OsRng` and Base64URL-encoded.
///
/// The caller stores it (cookie, session) before redirecting and compares it
/// with the `state` echoed back on the callback. This crate only carries it.
/// # Example
/// ```rust,no_run
/// use social_oauth::state::State;
///
/// let state = State::new().expect("Failed to generate state");
/// println!("Generated state: {}", state.value());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct State(pub(crate) String);

impl State {
    /// Generates 32 random bytes with `OsRng` and encodes them as unpadded Base64URL.
    pub fn new() -> Result<Self, StateError> {
        let mut key = [0u8; 32];
        OsRng.try_fill_bytes(&mut key).map_err(|e| {
            error!("Failed to generate state: {:?}", e);
            StateError
        })?;
        Ok(Self(URL_SAFE_NO_PAD.encode(key)))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl From<&str> for State {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Failed to generate state")]
pub struct StateError;
