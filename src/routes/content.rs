// SPDX-License-Identifier: MIT

//! Content and interaction routes.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{ContentWithInteractions, Platform};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/content/{platform}", get(get_content))
}

#[derive(Deserialize)]
pub struct ContentQuery {
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    /// Attach an engagement snapshot to every item.
    #[serde(default)]
    pub with_interactions: Option<bool>,
}

/// List a connected account's content, optionally joined with per-item
/// interaction snapshots.
async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<Value>> {
    let platform: Platform = platform.parse()?;
    let user_id = query
        .user_id
        .unwrap_or_else(|| state.config.default_user_id.clone());

    // Content fetches always run against a freshened token.
    let profile = state
        .credentials
        .ensure_fresh(&state.providers, platform, &user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let items = state.providers.list_content(platform, &profile).await?;

    if !query.with_interactions.unwrap_or(false) {
        return Ok(Json(json!({ "data": items })));
    }

    // Per-item snapshots fan out concurrently; each one is internally
    // best-effort, so a bad item degrades to empty facets.
    let snapshots = join_all(
        items
            .iter()
            .map(|item| state.providers.interactions(platform, &profile, item)),
    )
    .await;

    let joined: Vec<ContentWithInteractions> = items
        .into_iter()
        .zip(snapshots)
        .map(|(item, interactions)| ContentWithInteractions { item, interactions })
        .collect();

    Ok(Json(json!({ "data": joined })))
}
