// SPDX-License-Identifier: MIT

use social_pulse::config::Config;
use social_pulse::db::CredentialStore;
use social_pulse::oauth::StateManager;
use social_pulse::providers::ProviderSet;
use social_pulse::routes::create_router;
use social_pulse::services::CredentialService;
use social_pulse::AppState;
use std::sync::Arc;

/// Create an in-memory credential store.
#[allow(dead_code)]
pub async fn test_store() -> CredentialStore {
    CredentialStore::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory store")
}

/// Create a test app with an in-memory store and real (unreachable)
/// provider endpoints. Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_providers(ProviderSet::new(reqwest::Client::new())).await
}

/// Same, but with provider adapters pointed at stub servers.
#[allow(dead_code)]
pub async fn create_test_app_with_providers(
    providers: ProviderSet,
) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let store = test_store().await;
    let oauth_state = StateManager::new(config.oauth_state_key.clone());

    let state = Arc::new(AppState {
        credentials: CredentialService::new(store),
        providers,
        oauth_state,
        config,
    });

    (create_router(state.clone()), state)
}

/// Serve a stub provider API on an ephemeral port, returning its base URL.
#[allow(dead_code)]
pub async fn spawn_stub(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("stub server address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    format!("http://{addr}")
}
