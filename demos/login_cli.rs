// Register a redirect URI with the provider (e.g. http://localhost:3000/callback),
// then set a .env file:
// ```.env
// KAKAO_CLIENT_ID="your_client_id"
// KAKAO_CLIENT_SECRET="your_client_secret"   # optional for kakao
// KAKAO_REDIRECT_URI="http://localhost:3000/callback"
// NAVER_CLIENT_ID=...
// GOOGLE_CLIENT_ID=...
// ```
// Step 1: `cargo run --example login_cli -- kakao`
//         prints the authorization URL; open it in a browser and log in.
// Step 2: `cargo run --example login_cli -- kakao "<full callback url from the browser>"`
//         exchanges the code and prints the normalized identity.
use std::sync::Arc;

use anyhow::{Context, bail};
use social_oauth::{
    code::CallbackParams, config::ProviderRegistry, orchestrator::OAuthOrchestrator,
    provider::ProviderId, response::LoginResponse, state::State,
};
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log settings
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let provider: ProviderId = args
        .next()
        .context("usage: login_cli <kakao|naver|google> [callback_url]")?
        .parse()?;

    let registry = Arc::new(ProviderRegistry::from_env());
    if registry.is_empty() {
        bail!("no provider is configured, check your .env file");
    }
    let orchestrator = OAuthOrchestrator::new(registry.clone());

    let Some(callback_url) = args.next() else {
        let state = State::new()?;
        let url = orchestrator.build_auth_url(provider, state.value())?;
        println!("state: {}", state.value());
        println!("open: {}", url);
        return Ok(());
    };

    let redirect_uri = registry.get(provider)?.redirect_uri().to_string();
    let req = CallbackParams::from_url(&callback_url)?.into_request(provider, &redirect_uri)?;

    let result = orchestrator.authenticate_request(req).await;
    if let Err(e) = &result {
        error!("login failed: {}", e);
    }
    let body = LoginResponse::from_result(&result);
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
