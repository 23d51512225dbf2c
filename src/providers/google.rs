// SPDX-License-Identifier: MIT

//! Google adapter.
//!
//! Identity only: the authorization requests offline access so a refresh
//! token comes back, and the profile is read from the userinfo endpoint.
//! Google has no content feed here, so content listing is rejected.

use crate::config::AppCredentials;
use crate::error::AppError;
use crate::models::{ContentItem, SocialProfile};
use crate::providers::http::{check_json, request_failed};
use chrono::{Duration, Utc};
use serde::Deserialize;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Scopes every Google authorization needs: the profile plus Business
/// Profile access for the dashboard's review data.
pub const REQUIRED_SCOPES: [&str; 3] = [
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/business.manage",
];

/// Google OAuth adapter.
#[derive(Clone)]
pub struct GoogleProvider {
    http: reqwest::Client,
    token_url: String,
    userinfo_url: String,
    authorize_url: String,
}

impl GoogleProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
            authorize_url: AUTHORIZE_URL.to_string(),
        }
    }

    /// Override API endpoints (tests run against a local stub server).
    pub fn with_base_urls(
        http: reqwest::Client,
        token_url: String,
        userinfo_url: String,
        authorize_url: String,
    ) -> Self {
        Self {
            http,
            token_url,
            userinfo_url,
            authorize_url,
        }
    }

    /// Build the authorization URL. `access_type=offline` with
    /// `prompt=consent` makes Google return a refresh token.
    pub fn authorize_url(
        &self,
        app_id: &str,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> String {
        let scopes = crate::providers::union_scopes(&REQUIRED_SCOPES, scopes);
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}\
             &access_type=offline&prompt=consent&state={}",
            self.authorize_url,
            app_id,
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            state
        )
    }

    /// Exchange the code and fetch the user's profile.
    pub async fn complete(
        &self,
        app: &AppCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SocialProfile, AppError> {
        let token = self.exchange_code(app, code, redirect_uri).await?;
        let user = self.fetch_userinfo(&token.access_token).await?;

        let expires_at = token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Ok(SocialProfile {
            id: user.id,
            name: user.name,
            username: None,
            email: user.email,
            picture: user.picture,
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at,
            app_id: None,
            app_secret: None,
        })
    }

    async fn exchange_code(
        &self,
        app: &AppCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GoogleTokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", app.app_id.as_str()),
                ("client_secret", app.app_secret.as_str()),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Google token exchange", &e))?;

        check_json("Google token exchange", response).await
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<GoogleUser, AppError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| request_failed("Google userinfo fetch", &e))?;

        check_json("Google userinfo fetch", response).await
    }

    /// No content feed for Google accounts.
    pub fn list_content(&self) -> Result<Vec<ContentItem>, AppError> {
        Err(AppError::BadRequest(
            "Content listing is not supported for google".to_string(),
        ))
    }
}

// ─── Google API response shapes ──────────────────────────────────

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    name: String,
    email: Option<String>,
    picture: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_requests_offline_access() {
        let provider = GoogleProvider::new(reqwest::Client::new());
        let url = provider.authorize_url("g-client", "https://x/g", &[], "st");

        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains(&urlencoding::encode(REQUIRED_SCOPES[0]).into_owned()));
    }

    #[test]
    fn test_list_content_rejected() {
        let provider = GoogleProvider::new(reqwest::Client::new());
        assert!(matches!(
            provider.list_content(),
            Err(AppError::BadRequest(_))
        ));
    }
}
