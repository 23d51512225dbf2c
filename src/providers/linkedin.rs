// SPDX-License-Identifier: MIT

//! LinkedIn adapter.
//!
//! Standard OAuth 2.0 form-POST token exchange, then the v2 profile with a
//! field projection. Content listing goes through ugcPosts and engagement
//! through the socialActions endpoints keyed by post URN.

use crate::config::AppCredentials;
use crate::error::AppError;
use crate::models::interaction::INTERACTION_SAMPLE_LIMIT;
use crate::models::{Actor, Comment, ContentItem, InteractionSnapshot, SocialProfile};
use crate::providers::extract::{extract_hashtags, extract_mentions};
use crate::providers::http::{check_json, request_failed};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::Value;

const API_URL: &str = "https://api.linkedin.com";
const OAUTH_URL: &str = "https://www.linkedin.com/oauth/v2";

/// Scopes every LinkedIn authorization needs.
pub const REQUIRED_SCOPES: [&str; 2] = ["r_liteprofile", "r_emailaddress"];

/// LinkedIn v2 API adapter.
#[derive(Clone)]
pub struct LinkedinProvider {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
}

impl LinkedinProvider {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: API_URL.to_string(),
            oauth_url: OAUTH_URL.to_string(),
        }
    }

    /// Override API endpoints (tests run against a local stub server).
    pub fn with_base_urls(http: reqwest::Client, api_url: String, oauth_url: String) -> Self {
        Self {
            http,
            api_url,
            oauth_url,
        }
    }

    /// Build the authorization URL. LinkedIn scopes are space-separated.
    pub fn authorize_url(
        &self,
        app_id: &str,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
    ) -> String {
        let scopes = crate::providers::union_scopes(&REQUIRED_SCOPES, scopes);
        format!(
            "{}/authorization?response_type=code&client_id={}&redirect_uri={}&state={}&scope={}",
            self.oauth_url,
            app_id,
            urlencoding::encode(redirect_uri),
            state,
            urlencoding::encode(&scopes.join(" "))
        )
    }

    /// Exchange the code and assemble the profile. The email lookup is a
    /// separate endpoint and best-effort: a failure there never fails the
    /// connection.
    pub async fn complete(
        &self,
        app: &AppCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<SocialProfile, AppError> {
        let token = self.exchange_code(app, code, redirect_uri).await?;
        let me = self.fetch_me(&token.access_token).await?;

        let email = match self.fetch_email(&token.access_token).await {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!(error = %e, "LinkedIn email fetch failed");
                None
            }
        };

        let expires_at = token
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Ok(SocialProfile {
            name: format!("{} {}", me.localized_first_name, me.localized_last_name),
            picture: me.picture_url(),
            id: me.id,
            username: None,
            email,
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
    ) -> Result<LinkedinTokenResponse, AppError> {
        let response = self
            .http
            .post(format!("{}/accessToken", self.oauth_url))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", app.app_id.as_str()),
                ("client_secret", app.app_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| request_failed("LinkedIn token exchange", &e))?;

        check_json("LinkedIn token exchange", response).await
    }

    async fn fetch_me(&self, access_token: &str) -> Result<LinkedinMe, AppError> {
        let response = self
            .http
            .get(format!("{}/v2/me", self.api_url))
            .bearer_auth(access_token)
            .query(&[(
                "projection",
                "(id,localizedFirstName,localizedLastName,\
                 profilePicture(displayImage~:playableStreams))",
            )])
            .send()
            .await
            .map_err(|e| request_failed("LinkedIn profile fetch", &e))?;

        check_json("LinkedIn profile fetch", response).await
    }

    async fn fetch_email(&self, access_token: &str) -> Result<Option<String>, AppError> {
        let response = self
            .http
            .get(format!("{}/v2/emailAddress", self.api_url))
            .bearer_auth(access_token)
            .query(&[
                ("q", "members"),
                ("projection", "(elements*(handle~))"),
            ])
            .send()
            .await
            .map_err(|e| request_failed("LinkedIn email fetch", &e))?;

        let body: Value = check_json("LinkedIn email fetch", response).await?;
        Ok(body
            .pointer("/elements/0/handle~/emailAddress")
            .and_then(Value::as_str)
            .map(String::from))
    }

    // ─── Content & Interactions ──────────────────────────────────

    /// The member's UGC posts.
    pub async fn list_posts(&self, profile: &SocialProfile) -> Result<Vec<ContentItem>, AppError> {
        let author_urn = format!("urn:li:person:{}", profile.id);
        let authors = format!("List({})", urlencoding::encode(&author_urn));
        let response = self
            .http
            .get(format!("{}/v2/ugcPosts", self.api_url))
            .bearer_auth(&profile.access_token)
            .query(&[
                ("q", "authors"),
                ("authors", authors.as_str()),
                ("count", "25"),
            ])
            .send()
            .await
            .map_err(|e| request_failed("LinkedIn posts fetch", &e))?;

        let posts: Elements<Value> = check_json("LinkedIn posts fetch", response).await?;

        Ok(posts
            .elements
            .into_iter()
            .filter_map(|post| {
                let id = post.get("id")?.as_str()?.to_string();
                let text = post
                    .pointer(
                        "/specificContent/com.linkedin.ugc.ShareContent/shareCommentary/text",
                    )
                    .and_then(Value::as_str)
                    .map(String::from);
                let created_at = post
                    .pointer("/created/time")
                    .and_then(Value::as_i64)
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
                    .map(|t| t.to_rfc3339());
                Some(ContentItem {
                    permalink: Some(format!("https://www.linkedin.com/feed/update/{id}")),
                    id,
                    text,
                    created_at,
                    media_url: None,
                })
            })
            .collect())
    }

    /// Engagement snapshot for one post: summary counts plus comment and
    /// like samples, all best-effort and fetched concurrently.
    pub async fn post_interactions(
        &self,
        profile: &SocialProfile,
        item: &ContentItem,
    ) -> InteractionSnapshot {
        let token = &profile.access_token;
        let (summary, comments, likes) = tokio::join!(
            self.fetch_social_summary(token, &item.id),
            self.fetch_comments(token, &item.id),
            self.fetch_likes(token, &item.id),
        );

        let summary = summary.unwrap_or_else(|e| {
            tracing::warn!(post_id = %item.id, error = %e, "LinkedIn summary fetch failed");
            SocialSummary::default()
        });
        let comments = comments.unwrap_or_else(|e| {
            tracing::warn!(post_id = %item.id, error = %e, "LinkedIn comments fetch failed");
            Vec::new()
        });
        let likes = likes.unwrap_or_else(|e| {
            tracing::warn!(post_id = %item.id, error = %e, "LinkedIn likes fetch failed");
            Vec::new()
        });

        let text = item.text.as_deref().unwrap_or_default();

        InteractionSnapshot {
            likes_count: summary.likes_summary.total_likes,
            comments_count: summary.comments_summary.total_first_level_comments,
            shares_count: 0,
            reactions_count: summary.likes_summary.total_likes,
            comments: comments
                .into_iter()
                .take(INTERACTION_SAMPLE_LIMIT)
                .map(|c| Comment {
                    id: c.id,
                    text: c.message.map(|m| m.text).unwrap_or_default(),
                    author: c.actor,
                    created_at: c
                        .created
                        .and_then(|c| DateTime::<Utc>::from_timestamp_millis(c.time))
                        .map(|t| t.to_rfc3339()),
                })
                .collect(),
            reactions: likes
                .into_iter()
                .take(INTERACTION_SAMPLE_LIMIT)
                .map(|like| Actor {
                    id: like.actor,
                    name: None,
                    picture: None,
                })
                .collect(),
            shares: Vec::new(),
            hashtags: extract_hashtags(text),
            mentions: extract_mentions(text),
        }
    }

    async fn fetch_social_summary(
        &self,
        token: &str,
        post_urn: &str,
    ) -> Result<SocialSummary, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/v2/socialActions/{}",
                self.api_url,
                urlencoding::encode(post_urn)
            ))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| request_failed("LinkedIn summary fetch", &e))?;

        check_json("LinkedIn summary fetch", response).await
    }

    async fn fetch_comments(
        &self,
        token: &str,
        post_urn: &str,
    ) -> Result<Vec<LinkedinComment>, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/v2/socialActions/{}/comments",
                self.api_url,
                urlencoding::encode(post_urn)
            ))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| request_failed("LinkedIn comments fetch", &e))?;

        let list: Elements<LinkedinComment> =
            check_json("LinkedIn comments fetch", response).await?;
        Ok(list.elements)
    }

    async fn fetch_likes(&self, token: &str, post_urn: &str) -> Result<Vec<LinkedinLike>, AppError> {
        let response = self
            .http
            .get(format!(
                "{}/v2/socialActions/{}/likes",
                self.api_url,
                urlencoding::encode(post_urn)
            ))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| request_failed("LinkedIn likes fetch", &e))?;

        let list: Elements<LinkedinLike> = check_json("LinkedIn likes fetch", response).await?;
        Ok(list.elements)
    }
}

// ─── LinkedIn v2 response shapes ─────────────────────────────────

#[derive(Debug, Deserialize)]
struct LinkedinTokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkedinMe {
    id: String,
    localized_first_name: String,
    localized_last_name: String,
    profile_picture: Option<Value>,
}

impl LinkedinMe {
    /// Largest playable stream URL from the picture projection, if any.
    fn picture_url(&self) -> Option<String> {
        self.profile_picture
            .as_ref()?
            .pointer("/displayImage~/elements")?
            .as_array()?
            .last()?
            .pointer("/identifiers/0/identifier")?
            .as_str()
            .map(String::from)
    }
}

#[derive(Debug, Deserialize)]
struct Elements<T> {
    #[serde(default = "Vec::new")]
    elements: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SocialSummary {
    #[serde(default)]
    likes_summary: LikesSummary,
    #[serde(default)]
    comments_summary: CommentsSummary,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LikesSummary {
    #[serde(default)]
    total_likes: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentsSummary {
    #[serde(default)]
    total_first_level_comments: u32,
}

#[derive(Debug, Deserialize)]
struct LinkedinComment {
    // Comments are identified by URN, not a plain id field.
    #[serde(rename = "$URN", default)]
    id: String,
    actor: Option<String>,
    message: Option<CommentMessage>,
    created: Option<CreatedTime>,
}

#[derive(Debug, Deserialize)]
struct CommentMessage {
    text: String,
}

#[derive(Debug, Deserialize)]
struct CreatedTime {
    time: i64,
}

#[derive(Debug, Deserialize)]
struct LinkedinLike {
    actor: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_space_separated_scopes() {
        let provider = LinkedinProvider::new(reqwest::Client::new());
        let url = provider.authorize_url("li-client", "https://x/li", &[], "st");

        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=r_liteprofile%20r_emailaddress"));
        assert!(url.contains("state=st"));
    }

    #[test]
    fn test_picture_url_takes_largest_stream() {
        let me = LinkedinMe {
            id: "abc".into(),
            localized_first_name: "Ada".into(),
            localized_last_name: "Lovelace".into(),
            profile_picture: Some(serde_json::json!({
                "displayImage~": {
                    "elements": [
                        {"identifiers": [{"identifier": "https://img/small"}]},
                        {"identifiers": [{"identifier": "https://img/large"}]}
                    ]
                }
            })),
        };
        assert_eq!(me.picture_url().as_deref(), Some("https://img/large"));
    }
}
