// SPDX-License-Identifier: MIT

//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. The webhook verify token and the
//! OAuth state signing key are required; per-platform app credentials are
//! optional and a platform without them simply cannot be connected.

use crate::models::Platform;
use std::env;

/// OAuth application credentials for one platform.
#[derive(Debug, Clone)]
pub struct AppCredentials {
    /// Client/app ID (public)
    pub app_id: String,
    /// Client/app secret
    pub app_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Frontend URL for OAuth redirects and CORS
    pub frontend_url: String,
    /// SQLite database URL
    pub database_url: String,
    /// Meta webhook verification token (fatal when missing)
    pub webhook_verify_token: String,
    /// HMAC key for signing OAuth state tokens (raw bytes)
    pub oauth_state_key: Vec<u8>,
    /// User ID used when a request does not name one
    pub default_user_id: String,

    pub facebook: Option<AppCredentials>,
    pub instagram: Option<AppCredentials>,
    pub twitter: Option<AppCredentials>,
    pub linkedin: Option<AppCredentials>,
    pub google: Option<AppCredentials>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://social_pulse.db?mode=rwc".to_string()),
            webhook_verify_token: env::var("WEBHOOK_VERIFY_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("WEBHOOK_VERIFY_TOKEN"))?,
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
            default_user_id: env::var("DEFAULT_USER_ID")
                .unwrap_or_else(|_| "default-user".to_string()),
            facebook: app_from_env("FACEBOOK"),
            instagram: app_from_env("INSTAGRAM"),
            twitter: app_from_env("TWITTER"),
            linkedin: app_from_env("LINKEDIN"),
            google: app_from_env("GOOGLE"),
        })
    }

    /// App credentials for a platform, if configured.
    pub fn app_for(&self, platform: Platform) -> Option<&AppCredentials> {
        match platform {
            Platform::Facebook => self.facebook.as_ref(),
            Platform::Instagram => self.instagram.as_ref(),
            Platform::Twitter => self.twitter.as_ref(),
            Platform::Linkedin => self.linkedin.as_ref(),
            Platform::Google => self.google.as_ref(),
        }
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        let test_app = |id: &str| {
            Some(AppCredentials {
                app_id: id.to_string(),
                app_secret: format!("{id}-secret"),
            })
        };
        Self {
            port: 3000,
            frontend_url: "http://localhost:5173".to_string(),
            database_url: "sqlite::memory:".to_string(),
            webhook_verify_token: "test_verify_token".to_string(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
            default_user_id: "default-user".to_string(),
            facebook: test_app("fb-app"),
            instagram: test_app("ig-app"),
            twitter: test_app("tw-app"),
            linkedin: test_app("li-app"),
            google: test_app("g-app"),
        }
    }
}

/// Read a `{PREFIX}_APP_ID` / `{PREFIX}_APP_SECRET` pair; both must be set.
fn app_from_env(prefix: &str) -> Option<AppCredentials> {
    let app_id = env::var(format!("{prefix}_APP_ID")).ok()?;
    let app_secret = env::var(format!("{prefix}_APP_SECRET")).ok()?;
    Some(AppCredentials {
        app_id: app_id.trim().to_string(),
        app_secret: app_secret.trim().to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
