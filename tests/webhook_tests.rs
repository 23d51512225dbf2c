// SPDX-License-Identifier: MIT

//! Webhook verification endpoint tests.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

#[tokio::test]
async fn test_webhook_verification_echoes_challenge() {
    let (app, _state) = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(
                    "/auth/callback?hub.mode=subscribe&hub.challenge=challenge-123\
                     &hub.verify_token=test_verify_token",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    // The challenge comes back verbatim as plain text, not JSON.
    assert_eq!(&body[..], b"challenge-123");
}

#[tokio::test]
async fn test_webhook_verification_rejects_bad_token() {
    let (app, _state) = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(
                    "/auth/callback?hub.mode=subscribe&hub.challenge=challenge-123\
                     &hub.verify_token=wrong",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_webhook_verification_rejects_bad_mode() {
    let (app, _state) = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(
                    "/auth/callback?hub.mode=unsubscribe&hub.challenge=c\
                     &hub.verify_token=test_verify_token",
                )
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_health_check() {
    let (app, _state) = common::create_test_app().await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 1024)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}
