// SPDX-License-Identifier: MIT

//! OAuth connection routes.
//!
//! `GET /auth/{platform}` starts a flow by redirecting the browser to the
//! platform's authorization page; `GET /auth/{platform}/callback` finishes
//! it and lands the browser back on the frontend with either
//! `?connected={platform}` or `?error={code}`.

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::Platform;
use crate::providers::default_scopes;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/{platform}", get(auth_start))
        .route("/auth/{platform}/callback", get(auth_callback))
}

/// Query parameters for starting an OAuth flow.
#[derive(Deserialize)]
pub struct AuthStartParams {
    /// Extra scopes to request, comma-separated. The platform's required
    /// scopes are always included.
    #[serde(default)]
    scopes: Option<String>,
}

/// Start OAuth flow - redirect to the platform's authorization page.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(params): Query<AuthStartParams>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    let platform: Platform = platform.parse()?;
    let app = state
        .config
        .app_for(platform)
        .ok_or_else(|| AppError::BadRequest(format!("Platform {platform} is not configured")))?;

    let issued = state.oauth_state.issue(platform)?;
    let callback_url = callback_url(&headers, platform);

    let scopes: Vec<String> = match &params.scopes {
        Some(raw) => raw.split(',').map(|s| s.trim().to_string()).collect(),
        None => default_scopes(platform),
    };

    let auth_url = state.providers.authorize_url(
        platform,
        app,
        &callback_url,
        &scopes,
        &issued.state,
        &issued.pkce_verifier,
    );

    tracing::info!(
        platform = %platform,
        callback_url = %callback_url,
        "Starting OAuth flow"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    /// Set by the provider when the user denies the authorization.
    #[serde(default)]
    error: Option<String>,
}

/// Finish OAuth flow - exchange the code, persist credentials, and land
/// the browser back on the frontend.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(params): Query<CallbackParams>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    let platform: Platform = platform.parse()?;
    let frontend = &state.config.frontend_url;

    if let Some(error) = &params.error {
        tracing::warn!(platform = %platform, error = %error, "Authorization denied by provider");
        return Ok(frontend_error_redirect(frontend, error));
    }

    let (Some(code), Some(oauth_state)) = (&params.code, &params.state) else {
        return Ok(frontend_error_redirect(frontend, "missing_parameters"));
    };

    // State must verify before any token exchange happens.
    let issued = match state.oauth_state.verify_and_consume(platform, oauth_state) {
        Ok(issued) => issued,
        Err(e) => {
            tracing::warn!(platform = %platform, "OAuth state verification failed");
            return Ok(frontend_error_redirect(frontend, e.code()));
        }
    };

    let app = state
        .config
        .app_for(platform)
        .ok_or_else(|| AppError::BadRequest(format!("Platform {platform} is not configured")))?;
    let callback_url = callback_url(&headers, platform);

    let profile = match state
        .providers
        .complete(platform, app, code, &callback_url, &issued.pkce_verifier)
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(platform = %platform, error = %e, "OAuth completion failed");
            return Ok(frontend_error_redirect(frontend, e.code()));
        }
    };

    let user_id = &state.config.default_user_id;
    if let Err(e) = state.credentials.save(platform, &profile, user_id).await {
        // The mirror still holds the profile, so the connection works for
        // this process; surface the persistence problem on the frontend.
        tracing::error!(platform = %platform, error = %e, "Failed to persist credentials");
        return Ok(frontend_error_redirect(frontend, e.code()));
    }

    tracing::info!(
        platform = %platform,
        account_id = %profile.id,
        "Account connected"
    );

    Ok(Redirect::temporary(&format!(
        "{frontend}?connected={platform}"
    )))
}

fn frontend_error_redirect(frontend: &str, code: &str) -> Redirect {
    Redirect::temporary(&format!(
        "{}?error={}",
        frontend,
        urlencoding::encode(code)
    ))
}

/// Callback URL for a platform, derived from the request's Host header.
fn callback_url(headers: &axum::http::HeaderMap, platform: Platform) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "localhost:3000".to_string());

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{scheme}://{host}/auth/{platform}/callback")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_url_scheme() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("host", "localhost:3000".parse().unwrap());
        assert_eq!(
            callback_url(&headers, Platform::Facebook),
            "http://localhost:3000/auth/facebook/callback"
        );

        let mut headers = axum::http::HeaderMap::new();
        headers.insert("host", "api.example.com".parse().unwrap());
        assert_eq!(
            callback_url(&headers, Platform::Twitter),
            "https://api.example.com/auth/twitter/callback"
        );
    }
}
