// SPDX-License-Identifier: MIT

//! Webhook verification route.
//!
//! Providers verify a webhook subscription with a GET carrying
//! `hub.mode=subscribe`, a challenge, and the verify token configured when
//! the subscription was created. The challenge must be echoed back as
//! plain text.

use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/callback", get(verify))
}

/// Webhook verification query params.
#[derive(Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    mode: String,
    #[serde(rename = "hub.challenge", default)]
    challenge: String,
    #[serde(rename = "hub.verify_token", default)]
    verify_token: String,
}

/// Verify webhook subscription (GET).
async fn verify(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    if params.mode == "subscribe" && params.verify_token == state.config.webhook_verify_token {
        tracing::info!("Webhook subscription verified");
        (StatusCode::OK, params.challenge)
    } else {
        tracing::warn!(
            mode = %params.mode,
            "Webhook verification failed: invalid token"
        );
        (StatusCode::FORBIDDEN, String::new())
    }
}
