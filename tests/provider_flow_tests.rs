// SPDX-License-Identifier: MIT

//! OAuth completion flows run against local stub provider servers.

mod common;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use social_pulse::config::AppCredentials;
use social_pulse::error::AppError;
use social_pulse::providers::{FacebookProvider, InstagramProvider, TwitterProvider};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn test_app() -> AppCredentials {
    AppCredentials {
        app_id: "app-id".to_string(),
        app_secret: "app-secret".to_string(),
    }
}

/// Token endpoint shared by the Facebook-graph stubs: the code exchange
/// yields a short-lived token, the fb_exchange_token grant a long one.
async fn graph_token(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    if params.get("grant_type").map(String::as_str) == Some("fb_exchange_token") {
        Json(json!({"access_token": "long-token", "expires_in": 5184000}))
    } else {
        Json(json!({"access_token": "short-token", "expires_in": 3600}))
    }
}

#[tokio::test]
async fn test_facebook_complete_upgrades_to_long_lived_token() {
    let stub = Router::new()
        .route("/oauth/access_token", get(graph_token))
        .route(
            "/me",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                // Profile must be fetched with the long-lived token
                assert_eq!(params.get("access_token").unwrap(), "long-token");
                Json(json!({
                    "id": "fb-123",
                    "name": "Test User",
                    "email": "test@example.com",
                    "picture": {"data": {"url": "https://img/avatar"}}
                }))
            }),
        );
    let base = common::spawn_stub(stub).await;

    let provider =
        FacebookProvider::with_base_urls(reqwest::Client::new(), base.clone(), base.clone());
    let profile = provider
        .complete(&test_app(), "auth-code", "https://x/cb")
        .await
        .unwrap();

    assert_eq!(profile.id, "fb-123");
    assert_eq!(profile.access_token, "long-token");
    assert_eq!(profile.email.as_deref(), Some("test@example.com"));
    assert_eq!(profile.picture.as_deref(), Some("https://img/avatar"));
    assert!(profile.expires_at.is_some());
}

#[tokio::test]
async fn test_consumed_code_maps_to_conflict() {
    let stub = Router::new().route(
        "/oauth/access_token",
        get(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": {
                        "message": "This authorization code has been used.",
                        "type": "OAuthException",
                        "code": 100
                    }
                })),
            )
        }),
    );
    let base = common::spawn_stub(stub).await;

    let provider =
        FacebookProvider::with_base_urls(reqwest::Client::new(), base.clone(), base.clone());
    let result = provider
        .complete(&test_app(), "stale-code", "https://x/cb")
        .await;

    assert!(matches!(result, Err(AppError::CodeConsumed)));
}

#[tokio::test]
async fn test_invalid_grant_maps_to_conflict() {
    let stub = Router::new().route(
        "/2/oauth2/token",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "invalid_grant"})),
            )
        }),
    );
    let base = common::spawn_stub(stub).await;

    let provider = TwitterProvider::with_base_urls(
        reqwest::Client::new(),
        base.clone(),
        format!("{base}/authorize"),
    );
    let result = provider
        .complete(&test_app(), "stale-code", "https://x/cb", "verifier")
        .await;

    assert!(matches!(result, Err(AppError::CodeConsumed)));
}

/// Stub page lookups, counting how many pages get inspected. Page ids map
/// to their linked-account response; unknown ids return an empty object.
fn instagram_stub(lookups: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route("/oauth/access_token", get(graph_token))
        .route(
            "/me/accounts",
            get(|| async {
                Json(json!({"data": [
                    {"id": "page-1", "name": "First"},
                    {"id": "page-2", "name": "Second"},
                    {"id": "page-3", "name": "Third"}
                ]}))
            }),
        )
        .route(
            "/{page_id}",
            get(
                |State(lookups): State<Arc<AtomicUsize>>, Path(page_id): Path<String>| async move {
                    lookups.fetch_add(1, Ordering::SeqCst);
                    match page_id.as_str() {
                        "page-2" => Json(json!({
                            "id": "page-2",
                            "instagram_business_account": {
                                "id": "ig-55",
                                "username": "brand",
                                "name": "Brand",
                                "profile_picture_url": "https://img/ig"
                            }
                        })),
                        _ => Json(json!({"id": page_id})),
                    }
                },
            ),
        )
        .with_state(lookups)
}

#[tokio::test]
async fn test_instagram_discovery_short_circuits() {
    let lookups = Arc::new(AtomicUsize::new(0));
    let base = common::spawn_stub(instagram_stub(lookups.clone())).await;

    let provider = InstagramProvider::with_base_urls(
        reqwest::Client::new(),
        base.clone(),
        base.clone(),
        format!("{base}/dialog"),
    );
    let profile = provider
        .complete(&test_app(), "auth-code", "https://x/cb")
        .await
        .unwrap();

    assert_eq!(profile.id, "ig-55");
    assert_eq!(profile.username.as_deref(), Some("brand"));
    // App credentials are embedded so the refresh monitor can run later
    assert_eq!(profile.app_id.as_deref(), Some("app-id"));
    assert_eq!(profile.app_secret.as_deref(), Some("app-secret"));
    // page-3 must never be inspected once page-2 matched
    assert_eq!(lookups.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_instagram_without_business_account_is_distinct_error() {
    let stub = Router::new()
        .route("/oauth/access_token", get(graph_token))
        .route(
            "/me/accounts",
            get(|| async { Json(json!({"data": [{"id": "page-1"}]})) }),
        )
        .route(
            "/{page_id}",
            get(|Path(page_id): Path<String>| async move { Json(json!({"id": page_id})) }),
        );
    let base = common::spawn_stub(stub).await;

    let provider = InstagramProvider::with_base_urls(
        reqwest::Client::new(),
        base.clone(),
        base.clone(),
        format!("{base}/dialog"),
    );
    let result = provider
        .complete(&test_app(), "auth-code", "https://x/cb")
        .await;

    assert!(matches!(result, Err(AppError::NoBusinessAccount)));
}

#[tokio::test]
async fn test_instagram_tolerates_failing_page_lookup() {
    let stub = Router::new()
        .route("/oauth/access_token", get(graph_token))
        .route(
            "/me/accounts",
            get(|| async {
                Json(json!({"data": [{"id": "page-bad"}, {"id": "page-good"}]}))
            }),
        )
        .route(
            "/{page_id}",
            get(|Path(page_id): Path<String>| async move {
                if page_id == "page-bad" {
                    return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({}))).into_response();
                }
                Json(json!({
                    "id": page_id,
                    "connected_instagram_account": {"id": "ig-9", "username": "fallback"}
                }))
                .into_response()
            }),
        );
    let base = common::spawn_stub(stub).await;

    let provider = InstagramProvider::with_base_urls(
        reqwest::Client::new(),
        base.clone(),
        base.clone(),
        format!("{base}/dialog"),
    );
    let profile = provider
        .complete(&test_app(), "auth-code", "https://x/cb")
        .await
        .unwrap();

    // The failing page is skipped and the connected account still found
    assert_eq!(profile.id, "ig-9");
}

#[tokio::test]
async fn test_twitter_complete_sends_pkce_verifier() {
    let stub = Router::new()
        .route(
            "/2/oauth2/token",
            post(|body: String| async move {
                assert!(body.contains("code_verifier=my-verifier"));
                assert!(body.contains("grant_type=authorization_code"));
                Json(json!({
                    "access_token": "tw-token",
                    "refresh_token": "tw-refresh",
                    "expires_in": 7200,
                    "token_type": "bearer"
                }))
            }),
        )
        .route(
            "/2/users/me",
            get(|| async {
                Json(json!({"data": {
                    "id": "tw-1",
                    "name": "Tweeter",
                    "username": "tweeter",
                    "profile_image_url": "https://img/tw"
                }}))
            }),
        );
    let base = common::spawn_stub(stub).await;

    let provider = TwitterProvider::with_base_urls(
        reqwest::Client::new(),
        base.clone(),
        format!("{base}/authorize"),
    );
    let profile = provider
        .complete(&test_app(), "code", "https://x/cb", "my-verifier")
        .await
        .unwrap();

    assert_eq!(profile.id, "tw-1");
    assert_eq!(profile.username.as_deref(), Some("tweeter"));
    assert_eq!(profile.refresh_token.as_deref(), Some("tw-refresh"));
}
