// SPDX-License-Identifier: MIT

//! Twitter (X) adapter.
//!
//! OAuth 2.0 authorization-code flow with PKCE (plain method). The token
//! exchange authenticates the application with HTTP Basic auth and carries
//! the PKCE verifier issued alongside the state token.

use crate::config::AppCredentials;
use crate::error::AppError;
use crate::models::interaction::INTERACTION_SAMPLE_LIMIT;
use crate::models::{Actor, Comment, ContentItem, InteractionSnapshot, SocialProfile};
use crate::providers::extract::{extract_hashtags, extract_mentions};
use crate::providers::http::{check_json, request_failed};
use chrono::{Duration, Utc};
use serde::Deserialize;

const API_URL: &str = "https://api.twitter.com";
const AUTHORIZE_URL: &str = "https://twitter.com/i/oauth2/authorize";

/// Scopes every Twitter authorization needs to read the user and their
/// tweets.
pub const REQUIRED_SCOPES: [&str; 2] = ["tweet.read", "users.read"];

/// Twitter API v2 adapter.
#[derive(Clone)]
pub struct TwitterProvider {
    http: reqwest::Client,
    api_url: String,
    authorize_url: String,
}

impl TwitterProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: API_URL.to_string(),
            authorize_url: AUTHORIZE_URL.to_string(),
        }
    }

    /// Override API endpoints (tests run against a local stub server).
    pub fn with_base_urls(http: reqwest::Client, api_url: String, authorize_url: String) -> Self {
        Self {
            http,
            api_url,
            authorize_url,
        }
    }

    /// Build the authorization URL. Twitter scopes are space-separated,
    /// and the PKCE challenge uses the plain method, so the challenge is
    /// the verifier itself.
    pub fn authorize_url(
        &self,
        app_id: &str,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
        pkce_verifier: &str,
    ) -> String {
        let scopes = crate::providers::union_scopes(&REQUIRED_SCOPES, scopes);
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}\
             &code_challenge={}&code_challenge_method=plain",
            self.authorize_url,
            app_id,
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scopes.join(" ")),
            state,
            pkce_verifier
        )
    }

    /// Exchange the code (with the PKCE verifier) and fetch the user.
    pub async fn complete(
        &self,
        app: &AppCredentials,
        code: &str,
        redirect_uri: &str,
        pkce_verifier: &str,
    ) -> Result<SocialProfile, AppError> {
        let token = self
            .exchange_code(app, code, redirect_uri, pkce_verifier)
            .await?;
        let user = self.fetch_user(&token.access_token).await?;

        let expires_at = token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Ok(SocialProfile {
            id: user.id,
            name: user.name,
            username: Some(user.username),
            email: None,
            picture: user.profile_image_url,
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
        pkce_verifier: &str,
    ) -> Result<TwitterTokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/2/oauth2/token", self.api_url))
            .basic_auth(&app.app_id, Some(&app.app_secret))
            .form(&[
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", redirect_uri),
                ("code_verifier", pkce_verifier),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Twitter token exchange", &e))?;

        check_json("Twitter token exchange", response).await
    }

    async fn fetch_user(&self, access_token: &str) -> Result<TwitterUser, AppError> {
        let response = self
            .http
            .get(format!("{}/2/users/me", self.api_url))
            .bearer_auth(access_token)
            .query(&[("user.fields", "id,name,username,profile_image_url")])
            .send()
            .await
            .map_err(|e| request_failed("Twitter user fetch", &e))?;

        let wrapped: TwitterData<TwitterUser> = check_json("Twitter user fetch", response).await?;
        Ok(wrapped.data)
    }

    // ─── Content & Interactions ──────────────────────────────────

    /// The user's recent tweets.
    pub async fn list_tweets(&self, profile: &SocialProfile) -> Result<Vec<ContentItem>, AppError> {
        let response = self
            .http
            .get(format!("{}/2/users/{}/tweets", self.api_url, profile.id))
            .bearer_auth(&profile.access_token)
            .query(&[
                ("tweet.fields", "id,text,created_at,public_metrics"),
                ("max_results", "25"),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Twitter tweets fetch", &e))?;

        let tweets: TwitterList<Tweet> = check_json("Twitter tweets fetch", response).await?;

        let username = profile.username.as_deref().unwrap_or_default();
        Ok(tweets
            .data
            .into_iter()
            .map(|t| ContentItem {
                permalink: Some(format!("https://twitter.com/{}/status/{}", username, t.id)),
                id: t.id,
                text: Some(t.text),
                created_at: t.created_at,
                media_url: None,
            })
            .collect())
    }

    /// Engagement snapshot for one tweet: counts from `public_metrics`,
    /// samples from the replies search plus the retweeters and likers
    /// lists. Every facet is best-effort and fetched concurrently.
    pub async fn tweet_interactions(
        &self,
        profile: &SocialProfile,
        item: &ContentItem,
    ) -> InteractionSnapshot {
        let token = &profile.access_token;
        let (detail, replies, retweeters, likers) = tokio::join!(
            self.fetch_tweet_detail(token, &item.id),
            self.fetch_replies(token, &item.id),
            self.fetch_retweeters(token, &item.id),
            self.fetch_likers(token, &item.id),
        );

        let metrics = detail
            .map(|t| t.public_metrics.unwrap_or_default())
            .unwrap_or_else(|e| {
                tracing::warn!(tweet_id = %item.id, error = %e, "Twitter tweet detail fetch failed");
                PublicMetrics::default()
            });
        let replies = replies.unwrap_or_else(|e| {
            tracing::warn!(tweet_id = %item.id, error = %e, "Twitter replies fetch failed");
            Vec::new()
        });
        let retweeters = retweeters.unwrap_or_else(|e| {
            tracing::warn!(tweet_id = %item.id, error = %e, "Twitter retweeters fetch failed");
            Vec::new()
        });
        let likers = likers.unwrap_or_else(|e| {
            tracing::warn!(tweet_id = %item.id, error = %e, "Twitter likers fetch failed");
            Vec::new()
        });

        let text = item.text.as_deref().unwrap_or_default();

        InteractionSnapshot {
            likes_count: metrics.like_count,
            comments_count: metrics.reply_count,
            shares_count: metrics.retweet_count + metrics.quote_count,
            reactions_count: metrics.like_count,
            comments: replies
                .into_iter()
                .take(INTERACTION_SAMPLE_LIMIT)
                .map(|t| Comment {
                    id: t.id,
                    text: t.text,
                    author: None,
                    created_at: t.created_at,
                })
                .collect(),
            reactions: likers
                .into_iter()
                .take(INTERACTION_SAMPLE_LIMIT)
                .map(actor_from_user)
                .collect(),
            shares: retweeters
                .into_iter()
                .take(INTERACTION_SAMPLE_LIMIT)
                .map(actor_from_user)
                .collect(),
            hashtags: extract_hashtags(text),
            mentions: extract_mentions(text),
        }
    }

    async fn fetch_tweet_detail(&self, token: &str, tweet_id: &str) -> Result<Tweet, AppError> {
        let response = self
            .http
            .get(format!("{}/2/tweets/{}", self.api_url, tweet_id))
            .bearer_auth(token)
            .query(&[("tweet.fields", "public_metrics")])
            .send()
            .await
            .map_err(|e| request_failed("Twitter tweet detail", &e))?;

        let wrapped: TwitterData<Tweet> = check_json("Twitter tweet detail", response).await?;
        Ok(wrapped.data)
    }

    async fn fetch_replies(&self, token: &str, tweet_id: &str) -> Result<Vec<Tweet>, AppError> {
        let query = format!("conversation_id:{tweet_id}");
        let response = self
            .http
            .get(format!("{}/2/tweets/search/recent", self.api_url))
            .bearer_auth(token)
            .query(&[
                ("query", query.as_str()),
                ("tweet.fields", "id,text,created_at,author_id"),
                ("max_results", "25"),
            ])
            .send()
            .await
            .map_err(|e| request_failed("Twitter replies fetch", &e))?;

        let list: TwitterList<Tweet> = check_json("Twitter replies fetch", response).await?;
        Ok(list.data)
    }

    async fn fetch_retweeters(
        &self,
        token: &str,
        tweet_id: &str,
    ) -> Result<Vec<TwitterUser>, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/2/tweets/{}/retweeted_by",
                self.api_url, tweet_id
            ))
            .bearer_auth(token)
            .query(&[("user.fields", "id,name,username,profile_image_url")])
            .send()
            .await
            .map_err(|e| request_failed("Twitter retweeters fetch", &e))?;

        let list: TwitterList<TwitterUser> =
            check_json("Twitter retweeters fetch", response).await?;
        Ok(list.data)
    }

    async fn fetch_likers(&self, token: &str, tweet_id: &str) -> Result<Vec<TwitterUser>, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/2/tweets/{}/liking_users",
                self.api_url, tweet_id
            ))
            .bearer_auth(token)
            .query(&[("user.fields", "id,name,username,profile_image_url")])
            .send()
            .await
            .map_err(|e| request_failed("Twitter likers fetch", &e))?;

        let list: TwitterList<TwitterUser> = check_json("Twitter likers fetch", response).await?;
        Ok(list.data)
    }
}

fn actor_from_user(user: TwitterUser) -> Actor {
    Actor {
        id: user.id,
        name: Some(user.name),
        picture: user.profile_image_url,
    }
}

// ─── Twitter API v2 response shapes ──────────────────────────────

#[derive(Debug, Deserialize)]
struct TwitterTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TwitterData<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TwitterList<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    id: String,
    name: String,
    username: String,
    profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<String>,
    public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Default, Deserialize)]
struct PublicMetrics {
    #[serde(default)]
    like_count: u32,
    #[serde(default)]
    reply_count: u32,
    #[serde(default)]
    retweet_count: u32,
    #[serde(default)]
    quote_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_carries_pkce_challenge() {
        let provider = TwitterProvider::new(reqwest::Client::new());
        let url = provider.authorize_url(
            "tw-client",
            "https://x/tw",
            &[],
            "signed-state",
            "verifier-abc",
        );

        assert!(url.contains("code_challenge=verifier-abc"));
        assert!(url.contains("code_challenge_method=plain"));
        assert!(url.contains("state=signed-state"));
        // Space-separated scopes, URL-encoded
        assert!(url.contains("scope=tweet.read%20users.read"));
    }
}
