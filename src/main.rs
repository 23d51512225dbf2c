// SPDX-License-Identifier: MIT

//! Social-Pulse API Server
//!
//! Connects social platform accounts over OAuth, stores their credentials,
//! and serves content with engagement snapshots.

use social_pulse::{
    config::Config, db::CredentialStore, oauth::StateManager, providers::ProviderSet,
    services::CredentialService, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Social-Pulse API");

    let store = CredentialStore::connect(&config.database_url)
        .await
        .expect("Failed to open credential database");
    tracing::info!(database_url = %config.database_url, "Credential store ready");

    let http = reqwest::Client::new();
    let providers = ProviderSet::new(http);
    let oauth_state = StateManager::new(config.oauth_state_key.clone());

    let state = Arc::new(AppState {
        credentials: CredentialService::new(store),
        providers,
        oauth_state,
        config: config.clone(),
    });

    let app = social_pulse::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("social_pulse=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
