// SPDX-License-Identifier: MIT

//! Instagram adapter.
//!
//! Instagram Graph API access rides on Facebook's OAuth system: the code
//! exchange and the long-lived exchange go through the Facebook graph, and
//! the usable account is found by walking the user's pages for a linked
//! business/creator account. Media and comment fetches then go to
//! `graph.instagram.com`.

use crate::config::AppCredentials;
use crate::error::AppError;
use crate::models::interaction::INTERACTION_SAMPLE_LIMIT;
use crate::models::{Comment, ContentItem, InteractionSnapshot, SocialProfile};
use crate::providers::extract::{extract_hashtags, extract_mentions};
use crate::providers::http::{check_json, request_failed};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const GRAPH_URL: &str = "https://graph.facebook.com/v18.0";
const MEDIA_URL: &str = "https://graph.instagram.com";
const DIALOG_URL: &str = "https://www.facebook.com/v18.0/dialog/oauth";

/// Scopes every Instagram authorization needs, whatever the caller asked
/// for: page listing and page engagement are required for the
/// business-account discovery walk.
pub const REQUIRED_SCOPES: [&str; 3] =
    ["instagram_basic", "pages_show_list", "pages_read_engagement"];

/// Instagram Graph API adapter.
#[derive(Clone)]
pub struct InstagramProvider {
    http: reqwest::Client,
    graph_url: String,
    media_url: String,
    dialog_url: String,
}

impl InstagramProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            graph_url: GRAPH_URL.to_string(),
            media_url: MEDIA_URL.to_string(),
            dialog_url: DIALOG_URL.to_string(),
        }
    }

    /// Override API endpoints (tests run against a local stub server).
    pub fn with_base_urls(
        http: reqwest::Client,
        graph_url: String,
        media_url: String,
        dialog_url: String,
    ) -> Self {
        Self {
            http,
            graph_url,
            media_url,
            dialog_url,
        }
    }

    /// Build the authorization URL; required scopes are unioned into the
    /// caller's.
    pub fn authorize_url(
        &self,
        app_id: &str,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> String {
        let scopes = crate::providers::union_scopes(&REQUIRED_SCOPES, scopes);
        format!(
            "{}?client_id={}&redirect_uri={}&scope={}&response_type=code&state={}",
            self.dialog_url,
            app_id,
            urlencoding::encode(redirect_uri),
            scopes.join(","),
            state
        )
    }

    /// Exchange the code, upgrade to a long-lived token, then walk the
    /// user's pages for a linked Instagram business/creator account.
    ///
    /// Zero matches is the distinct [`AppError::NoBusinessAccount`]
    /// condition, not a generic failure.
    pub async fn complete(
        &self,
        app: &AppCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SocialProfile, AppError> {
        let short = self.exchange_code(app, code, redirect_uri).await?;
        let long = self
            .exchange_long_lived(&short.access_token, &app.app_id, &app.app_secret)
            .await?;

        let pages = self.list_pages(&long.access_token).await?;
        let account = self
            .discover_business_account(&long.access_token, &pages)
            .await?;

        let expires_at = long
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        tracing::info!(
            instagram_id = %account.id,
            username = %account.username,
            "Instagram business account discovered"
        );

        Ok(SocialProfile {
            id: account.id,
            name: account.name.unwrap_or_else(|| account.username.clone()),
            username: Some(account.username),
            email: None,
            picture: account.profile_picture_url,
            access_token: long.access_token,
            refresh_token: None,
            expires_at,
            app_id: Some(app.app_id.clone()),
            app_secret: Some(app.app_secret.clone()),
        })
    }

    /// Walk pages until one yields a linked account, short-circuiting on
    /// the first match. A page whose lookup fails is skipped, not fatal.
    async fn discover_business_account(
        &self,
        access_token: &str,
        pages: &[Page],
    ) -> Result<InstagramAccount, AppError> {
        for page in pages {
            let linked = match self.page_linked_account(access_token, &page.id).await {
                Ok(linked) => linked,
                Err(e) => {
                    tracing::warn!(page_id = %page.id, error = %e, "Page lookup failed, skipping");
                    continue;
                }
            };

            // Business account preferred; fall back to connected account.
            if let Some(account) = linked
                .instagram_business_account
                .or(linked.connected_instagram_account)
            {
                return Ok(account);
            }
        }

        Err(AppError::NoBusinessAccount)
    }

    async fn exchange_code(
        &self,
        app: &AppCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<GraphTokenResponse, AppError> {
        let response = self
            .http
            .get(format!("{}/oauth/access_token", self.graph_url))
            .query(&[
                ("client_id", app.app_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("client_secret", app.app_secret.as_str()),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Instagram token exchange", &e))?;

        check_json("Instagram token exchange", response).await
    }

    /// Long-lived token exchange, also used by the refresh monitor with
    /// the app credentials embedded in the stored record.
    pub async fn exchange_long_lived(
        &self,
        access_token: &str,
        app_id: &str,
        app_secret: &str,
    ) -> Result<GraphTokenResponse, AppError> {
        let response = self
            .http
            .get(format!("{}/oauth/access_token", self.graph_url))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", app_id),
                ("client_secret", app_secret),
                ("fb_exchange_token", access_token),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Instagram long-lived exchange", &e))?;

        check_json("Instagram long-lived exchange", response).await
    }

    /// Refresh a stored long-lived token. Returns the new token and expiry.
    pub async fn refresh_token(
        &self,
        access_token: &str,
        app_id: &str,
        app_secret: &str,
    ) -> Result<(String, Option<DateTime<Utc>>), AppError> {
        let refreshed = self
            .exchange_long_lived(access_token, app_id, app_secret)
            .await?;
        let expires_at = refreshed
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        Ok((refreshed.access_token, expires_at))
    }

    async fn list_pages(&self, access_token: &str) -> Result<Vec<Page>, AppError> {
        let response = self
            .http
            .get(format!("{}/me/accounts", self.graph_url))
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| request_failed("Instagram page listing", &e))?;

        let pages: DataList<Page> = check_json("Instagram page listing", response).await?;
        Ok(pages.data)
    }

    async fn page_linked_account(
        &self,
        access_token: &str,
        page_id: &str,
    ) -> Result<PageLinkedAccounts, AppError> {
        let response = self
            .http
            .get(format!("{}/{}", self.graph_url, page_id))
            .query(&[
                (
                    "fields",
                    "instagram_business_account{id,username,profile_picture_url,name},\
                     connected_instagram_account{id,username,profile_picture_url,name}",
                ),
                ("access_token", access_token),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Instagram page lookup", &e))?;

        check_json("Instagram page lookup", response).await
    }

    // ─── Content & Interactions ──────────────────────────────────

    /// One page of the user's media.
    pub async fn list_media(&self, profile: &SocialProfile) -> Result<Vec<ContentItem>, AppError> {
        let response = self
            .http
            .get(format!("{}/me/media", self.media_url))
            .query(&[
                (
                    "fields",
                    "id,caption,media_type,media_url,permalink,thumbnail_url,timestamp,username",
                ),
                ("access_token", profile.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Instagram media fetch", &e))?;

        let media: DataList<InstagramMedia> =
            check_json("Instagram media fetch", response).await?;

        Ok(media
            .data
            .into_iter()
            .map(|m| ContentItem {
                id: m.id,
                text: m.caption,
                created_at: m.timestamp,
                permalink: m.permalink,
                media_url: m.media_url.or(m.thumbnail_url),
            })
            .collect())
    }

    /// Engagement snapshot for one media item. The comments fetch is
    /// best-effort; Instagram no longer reports like counts directly.
    pub async fn media_interactions(
        &self,
        profile: &SocialProfile,
        item: &ContentItem,
    ) -> InteractionSnapshot {
        let comments = self
            .fetch_comments(&profile.access_token, &item.id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(media_id = %item.id, error = %e, "Instagram comments fetch failed");
                Vec::new()
            });

        let text = item.text.as_deref().unwrap_or_default();

        InteractionSnapshot {
            likes_count: 0,
            comments_count: comments.len() as u32,
            shares_count: 0,
            reactions_count: 0,
            comments: comments
                .into_iter()
                .take(INTERACTION_SAMPLE_LIMIT)
                .map(|c| Comment {
                    id: c.id,
                    text: c.text,
                    author: c.username,
                    created_at: c.timestamp,
                })
                .collect(),
            reactions: Vec::new(),
            shares: Vec::new(),
            hashtags: extract_hashtags(text),
            mentions: extract_mentions(text),
        }
    }

    async fn fetch_comments(
        &self,
        token: &str,
        media_id: &str,
    ) -> Result<Vec<InstagramComment>, AppError> {
        let response = self
            .http
            .get(format!("{}/{}/comments", self.media_url, media_id))
            .query(&[
                ("fields", "id,text,timestamp,username,like_count"),
                ("access_token", token),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Instagram comments fetch", &e))?;

        let list: DataList<InstagramComment> =
            check_json("Instagram comments fetch", response).await?;
        Ok(list.data)
    }
}

// ─── Graph API response shapes ───────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct GraphTokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DataList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Page {
    id: String,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinkedAccounts {
    instagram_business_account: Option<InstagramAccount>,
    connected_instagram_account: Option<InstagramAccount>,
}

#[derive(Debug, Deserialize)]
struct InstagramAccount {
    id: String,
    username: String,
    name: Option<String>,
    profile_picture_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstagramMedia {
    id: String,
    caption: Option<String>,
    media_url: Option<String>,
    thumbnail_url: Option<String>,
    permalink: Option<String>,
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InstagramComment {
    id: String,
    text: String,
    timestamp: Option<String>,
    username: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_unions_required_scopes() {
        let provider = InstagramProvider::new(reqwest::Client::new());
        let url = provider.authorize_url(
            "ig-app",
            "https://x/ig",
            &["instagram_manage_comments".to_string()],
            "s",
        );

        for scope in REQUIRED_SCOPES {
            assert!(url.contains(scope), "missing required scope {scope}");
        }
        assert!(url.contains("instagram_manage_comments"));
    }
}
