//! Shared helpers for tests that talk to an `httpmock` server.
use std::time::Duration;

use httpmock::MockServer;

use crate::{config::ProviderConfig, provider::ProviderId};

/// A configuration whose token endpoint is `/oauth/token` and user-info endpoint is
/// `/v2/user/me` on `server`. Credentials are `<provider>-client` / `<provider>-secret`.
pub(crate) fn mock_config(provider: ProviderId, server: &MockServer) -> ProviderConfig {
    ProviderConfig::builder(provider)
        .client_id(&format!("{provider}-client"))
        .client_secret(&format!("{provider}-secret"))
        .redirect_uri(&format!("https://app.example.com/{provider}"))
        .token_endpoint(&server.url("/oauth/token"))
        .user_info_endpoint(&server.url("/v2/user/me"))
        .timeout(Duration::from_secs(2))
        .build()
        .expect("mock provider config")
}
