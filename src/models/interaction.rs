// SPDX-License-Identifier: MIT

//! Normalized content and interaction shapes.
//!
//! Every provider's posts/tweets/media map into [`ContentItem`], and the
//! per-item engagement facets map into [`InteractionSnapshot`]. Snapshots
//! are derived on every fetch and never persisted.

use serde::{Deserialize, Serialize};

/// Bound on the recent-items sample kept per facet (comments, reactions,
/// shares). Counts still reflect provider totals where available.
pub const INTERACTION_SAMPLE_LIMIT: usize = 25;

/// One post/tweet/media item in normalized form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    /// Message, caption, or tweet text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

/// A single comment/reply on a content item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Someone who reacted to / liked / shared a content item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Per-item engagement aggregate. Facets a provider does not expose (or
/// that failed to fetch) are zero/empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionSnapshot {
    pub likes_count: u32,
    pub comments_count: u32,
    pub shares_count: u32,
    pub reactions_count: u32,
    pub comments: Vec<Comment>,
    pub reactions: Vec<Actor>,
    pub shares: Vec<Actor>,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
}

/// Content item joined with its interaction snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ContentWithInteractions {
    #[serde(flatten)]
    pub item: ContentItem,
    pub interactions: InteractionSnapshot,
}
