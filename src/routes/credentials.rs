// SPDX-License-Identifier: MIT

//! Credential storage routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::{Platform, SocialProfile};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/database/credentials/{platform}",
        post(save_credentials)
            .get(get_credentials)
            .delete(delete_credentials),
    )
}

/// Save request body: the profile fields sit at the top level with an
/// optional `userId` alongside, matching the dashboard client's payload.
#[derive(Deserialize)]
pub struct SaveCredentialsBody {
    #[serde(flatten)]
    pub profile: SocialProfile,
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    /// Refresh the token before returning if it is close to expiry.
    #[serde(default)]
    pub ensure_fresh: Option<bool>,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Store credentials for a platform.
async fn save_credentials(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Json(body): Json<SaveCredentialsBody>,
) -> Result<Json<SuccessResponse>> {
    let platform: Platform = platform.parse()?;
    let user_id = body
        .user_id
        .unwrap_or_else(|| state.config.default_user_id.clone());

    state
        .credentials
        .save(platform, &body.profile, &user_id)
        .await?;

    tracing::info!(platform = %platform, user_id = %user_id, "Credentials saved");
    Ok(Json(SuccessResponse { success: true }))
}

/// Fetch stored credentials for a platform. 404 when none are stored.
async fn get_credentials(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(query): Query<CredentialsQuery>,
) -> Result<Json<SocialProfile>> {
    let platform: Platform = platform.parse()?;
    let user_id = query
        .user_id
        .unwrap_or_else(|| state.config.default_user_id.clone());

    let profile = if query.ensure_fresh.unwrap_or(false) {
        state
            .credentials
            .ensure_fresh(&state.providers, platform, &user_id)
            .await?
    } else {
        state.credentials.load(platform, &user_id).await?
    };

    profile.map(Json).ok_or_else(|| {
        AppError::NotFound(format!("No credentials stored for platform {platform}"))
    })
}

/// Remove stored credentials for a platform. 404 when nothing was stored.
async fn delete_credentials(
    State(state): State<Arc<AppState>>,
    Path(platform): Path<String>,
    Query(query): Query<CredentialsQuery>,
) -> Result<(StatusCode, Json<SuccessResponse>)> {
    let platform: Platform = platform.parse()?;
    let user_id = query
        .user_id
        .unwrap_or_else(|| state.config.default_user_id.clone());

    let removed = state.credentials.remove(platform, &user_id).await;
    tracing::info!(platform = %platform, user_id = %user_id, removed, "Credentials delete");

    let status = if removed {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(SuccessResponse { success: removed })))
}
