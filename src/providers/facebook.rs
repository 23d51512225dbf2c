// SPDX-License-Identifier: MIT

//! Facebook adapter: Graph API OAuth and post engagement.
//!
//! `complete` performs the code exchange and then automatically trades the
//! short-lived token for a long-lived one (~60 days) before fetching the
//! profile.

use crate::config::AppCredentials;
use crate::error::AppError;
use crate::models::interaction::INTERACTION_SAMPLE_LIMIT;
use crate::models::{Actor, Comment, ContentItem, InteractionSnapshot, SocialProfile};
use crate::providers::extract::{extract_hashtags, extract_tagged_mentions};
use crate::providers::http::{check_json, request_failed};
use chrono::{Duration, Utc};
use serde::Deserialize;

const GRAPH_URL: &str = "https://graph.facebook.com/v18.0";
const DIALOG_URL: &str = "https://www.facebook.com/v18.0/dialog/oauth";

/// Facebook Graph API adapter.
#[derive(Clone)]
pub struct FacebookProvider {
    http: reqwest::Client,
    graph_url: String,
    dialog_url: String,
}

impl FacebookProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            graph_url: GRAPH_URL.to_string(),
            dialog_url: DIALOG_URL.to_string(),
        }
    }

    /// Override API endpoints (tests run against a local stub server).
    pub fn with_base_urls(http: reqwest::Client, graph_url: String, dialog_url: String) -> Self {
        Self {
            http,
            graph_url,
            dialog_url,
        }
    }

    /// Build the authorization URL the browser is redirected to.
    pub fn authorize_url(
        &self,
        app_id: &str,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&scope={}&response_type=code&state={}",
            self.dialog_url,
            app_id,
            urlencoding::encode(redirect_uri),
            scopes.join(","),
            state
        )
    }

    /// Exchange the authorization code and normalize the profile.
    pub async fn complete(
        &self,
        app: &AppCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SocialProfile, AppError> {
        let short = self.exchange_code(app, code, redirect_uri).await?;
        let long = self.exchange_long_lived(app, &short.access_token).await?;

        let user = self.fetch_profile(&long.access_token).await?;

        let expires_at = long
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        tracing::info!(facebook_id = %user.id, "Facebook OAuth completed");

        Ok(SocialProfile {
            id: user.id,
            name: user.name,
            username: None,
            email: user.email,
            picture: user.picture.and_then(|p| p.data).and_then(|d| d.url),
            access_token: long.access_token,
            refresh_token: None,
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
            .map_err(|e| request_failed("Facebook token exchange", &e))?;

        check_json("Facebook token exchange", response).await
    }

    /// Trade a short-lived token for a long-lived one.
    pub async fn exchange_long_lived(
        &self,
        app: &AppCredentials,
        access_token: &str,
    ) -> Result<GraphTokenResponse, AppError> {
        let response = self
            .http
            .get(format!("{}/oauth/access_token", self.graph_url))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", app.app_id.as_str()),
                ("client_secret", app.app_secret.as_str()),
                ("fb_exchange_token", access_token),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Facebook long-lived exchange", &e))?;

        check_json("Facebook long-lived exchange", response).await
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<FacebookUser, AppError> {
        let response = self
            .http
            .get(format!("{}/me", self.graph_url))
            .query(&[
                ("fields", "id,name,email,picture"),
                ("access_token", access_token),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Facebook profile fetch", &e))?;

        check_json("Facebook profile fetch", response).await
    }

    // ─── Content & Interactions ──────────────────────────────────

    /// One page of the user's posts.
    pub async fn list_posts(&self, profile: &SocialProfile) -> Result<Vec<ContentItem>, AppError> {
        let response = self
            .http
            .get(format!("{}/me/posts", self.graph_url))
            .query(&[
                (
                    "fields",
                    "id,message,created_time,permalink_url,full_picture",
                ),
                ("access_token", profile.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Facebook posts fetch", &e))?;

        let posts: DataList<FacebookPost> = check_json("Facebook posts fetch", response).await?;

        Ok(posts
            .data
            .into_iter()
            .map(|post| ContentItem {
                id: post.id,
                text: post.message,
                created_at: post.created_time,
                permalink: post.permalink_url,
                media_url: post.full_picture,
            })
            .collect())
    }

    /// Engagement snapshot for one post. Facets are independently
    /// best-effort: a failed facet yields an empty list, not an error.
    pub async fn post_interactions(
        &self,
        profile: &SocialProfile,
        item: &ContentItem,
    ) -> InteractionSnapshot {
        let token = profile.access_token.as_str();
        let (comments, reactions, shares, summary) = tokio::join!(
            self.fetch_comments(token, &item.id),
            self.fetch_reactions(token, &item.id),
            self.fetch_shared_posts(token, &item.id),
            self.fetch_engagement_summary(token, &item.id),
        );

        let comments = comments.unwrap_or_else(|e| {
            tracing::warn!(post_id = %item.id, error = %e, "Facebook comments fetch failed");
            Vec::new()
        });
        let reactions = reactions.unwrap_or_else(|e| {
            tracing::warn!(post_id = %item.id, error = %e, "Facebook reactions fetch failed");
            Vec::new()
        });
        let shares = shares.unwrap_or_else(|e| {
            tracing::warn!(post_id = %item.id, error = %e, "Facebook shares fetch failed");
            Vec::new()
        });
        let summary = summary.unwrap_or_else(|e| {
            tracing::warn!(post_id = %item.id, error = %e, "Facebook summary fetch failed");
            EngagementSummary::default()
        });

        let text = item.text.as_deref().unwrap_or_default();

        InteractionSnapshot {
            likes_count: summary
                .likes
                .and_then(|w| w.summary)
                .map_or(0, |s| s.total_count),
            comments_count: summary
                .comments
                .and_then(|w| w.summary)
                .map_or(0, |s| s.total_count),
            shares_count: summary.shares.map_or(0, |s| s.count),
            reactions_count: reactions.len() as u32,
            comments: comments
                .into_iter()
                .take(INTERACTION_SAMPLE_LIMIT)
                .map(|c| Comment {
                    id: c.id,
                    text: c.message,
                    author: c.from.map(|f| f.name),
                    created_at: c.created_time,
                })
                .collect(),
            reactions: reactions
                .into_iter()
                .take(INTERACTION_SAMPLE_LIMIT)
                .map(|r| Actor {
                    id: r.id,
                    name: Some(r.name),
                    picture: r.picture.and_then(|p| p.data).and_then(|d| d.url),
                })
                .collect(),
            shares: shares
                .into_iter()
                .take(INTERACTION_SAMPLE_LIMIT)
                .filter_map(|s| s.from)
                .map(|f| Actor {
                    id: f.id,
                    name: Some(f.name),
                    picture: None,
                })
                .collect(),
            hashtags: extract_hashtags(text),
            mentions: extract_tagged_mentions(text),
        }
    }

    async fn fetch_comments(
        &self,
        token: &str,
        post_id: &str,
    ) -> Result<Vec<FacebookComment>, AppError> {
        let response = self
            .http
            .get(format!("{}/{}/comments", self.graph_url, post_id))
            .query(&[
                ("fields", "id,message,created_time,from{id,name},like_count"),
                ("access_token", token),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Facebook comments fetch", &e))?;

        let list: DataList<FacebookComment> =
            check_json("Facebook comments fetch", response).await?;
        Ok(list.data)
    }

    async fn fetch_reactions(
        &self,
        token: &str,
        post_id: &str,
    ) -> Result<Vec<FacebookReaction>, AppError> {
        let response = self
            .http
            .get(format!("{}/{}/reactions", self.graph_url, post_id))
            .query(&[
                ("fields", "id,name,type,picture"),
                ("access_token", token),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Facebook reactions fetch", &e))?;

        let list: DataList<FacebookReaction> =
            check_json("Facebook reactions fetch", response).await?;
        Ok(list.data)
    }

    async fn fetch_shared_posts(
        &self,
        token: &str,
        post_id: &str,
    ) -> Result<Vec<FacebookSharedPost>, AppError> {
        let response = self
            .http
            .get(format!("{}/{}/sharedposts", self.graph_url, post_id))
            .query(&[("fields", "id,from{id,name}"), ("access_token", token)])
            .send()
            .await
            .map_err(|e| request_failed("Facebook shares fetch", &e))?;

        let list: DataList<FacebookSharedPost> =
            check_json("Facebook shares fetch", response).await?;
        Ok(list.data)
    }

    async fn fetch_engagement_summary(
        &self,
        token: &str,
        post_id: &str,
    ) -> Result<EngagementSummary, AppError> {
        let response = self
            .http
            .get(format!("{}/{}", self.graph_url, post_id))
            .query(&[
                (
                    "fields",
                    "likes.summary(true),comments.summary(true),shares",
                ),
                ("access_token", token),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Facebook summary fetch", &e))?;

        check_json("Facebook summary fetch", response).await
    }
}

// ─── Graph API response shapes ───────────────────────────────────

/// Token response from both the code and long-lived exchanges.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphTokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct FacebookUser {
    id: String,
    name: String,
    email: Option<String>,
    picture: Option<PictureWrap>,
}

#[derive(Debug, Deserialize)]
struct PictureWrap {
    data: Option<PictureData>,
}

#[derive(Debug, Deserialize)]
struct PictureData {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct FacebookPost {
    id: String,
    message: Option<String>,
    created_time: Option<String>,
    permalink_url: Option<String>,
    full_picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FacebookComment {
    id: String,
    message: String,
    created_time: Option<String>,
    from: Option<FacebookActor>,
}

#[derive(Debug, Deserialize)]
struct FacebookReaction {
    id: String,
    name: String,
    picture: Option<PictureWrap>,
}

#[derive(Debug, Deserialize)]
struct FacebookSharedPost {
    from: Option<FacebookActor>,
}

#[derive(Debug, Deserialize)]
struct FacebookActor {
    id: String,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct EngagementSummary {
    likes: Option<SummaryWrap>,
    comments: Option<SummaryWrap>,
    shares: Option<ShareCount>,
}

#[derive(Debug, Deserialize)]
struct SummaryWrap {
    summary: Option<TotalCount>,
}

#[derive(Debug, Deserialize)]
struct TotalCount {
    total_count: u32,
}

#[derive(Debug, Deserialize)]
struct ShareCount {
    count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_contents() {
        let provider = FacebookProvider::new(reqwest::Client::new());
        let url = provider.authorize_url(
            "123",
            "https://x/fb",
            &["user_posts".to_string()],
            "opaque-state",
        );

        assert!(url.starts_with(DIALOG_URL));
        assert!(url.contains("client_id=123"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fx%2Ffb"));
        assert!(url.contains("scope=user_posts"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("state=opaque-state"));
    }
}
