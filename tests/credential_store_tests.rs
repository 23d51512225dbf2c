// SPDX-License-Identifier: MIT

//! Credential store tests against an in-memory SQLite database.

mod common;

use chrono::Utc;
use social_pulse::models::{Platform, SocialProfile};

fn profile(id: &str, token: &str) -> SocialProfile {
    SocialProfile {
        id: id.to_string(),
        name: "Account".to_string(),
        username: Some("account".to_string()),
        email: None,
        picture: None,
        access_token: token.to_string(),
        refresh_token: None,
        expires_at: Some(Utc::now() + chrono::Duration::days(60)),
        app_id: None,
        app_secret: None,
    }
}

#[tokio::test]
async fn test_upsert_then_get_round_trips() {
    let store = common::test_store().await;

    store
        .upsert_credentials(Platform::Facebook, &profile("acct-1", "tok-1"), "u1")
        .await
        .unwrap();

    let loaded = store
        .get_credentials(Platform::Facebook, "u1")
        .await
        .unwrap()
        .expect("credentials stored");

    assert_eq!(loaded.id, "acct-1");
    assert_eq!(loaded.access_token, "tok-1");
    assert!(loaded.expires_at.is_some());
}

#[tokio::test]
async fn test_reconnect_updates_in_place() {
    let store = common::test_store().await;

    store
        .upsert_credentials(Platform::Instagram, &profile("acct-1", "first"), "u1")
        .await
        .unwrap();
    store
        .upsert_credentials(Platform::Instagram, &profile("acct-1", "second"), "u1")
        .await
        .unwrap();

    let loaded = store
        .get_credentials(Platform::Instagram, "u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.access_token, "second");
}

#[tokio::test]
async fn test_platforms_are_isolated() {
    let store = common::test_store().await;

    store
        .upsert_credentials(Platform::Facebook, &profile("acct-fb", "tok-fb"), "u1")
        .await
        .unwrap();

    assert!(store
        .get_credentials(Platform::Twitter, "u1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_delete_reports_whether_anything_was_removed() {
    let store = common::test_store().await;

    store
        .upsert_credentials(Platform::Google, &profile("acct-1", "t"), "u1")
        .await
        .unwrap();

    assert!(store
        .delete_credentials(Platform::Google, "u1")
        .await
        .unwrap());
    assert!(!store
        .delete_credentials(Platform::Google, "u1")
        .await
        .unwrap());
    assert!(store
        .get_credentials(Platform::Google, "u1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_first_connection_creates_placeholder_user() {
    let store = common::test_store().await;

    // Profile without an email gets the placeholder
    store
        .upsert_credentials(Platform::Twitter, &profile("acct-1", "t"), "u1")
        .await
        .unwrap();

    let user = store.get_user("u1").await.unwrap().expect("user created");
    assert_eq!(user.id, "u1");
    assert_eq!(user.email, "u1@example.com");
    assert_eq!(user.name, "Account");
}

#[tokio::test]
async fn test_user_row_is_not_overwritten_on_reconnect() {
    let store = common::test_store().await;

    let mut first = profile("acct-1", "t");
    first.email = Some("real@example.com".to_string());
    store
        .upsert_credentials(Platform::Linkedin, &first, "u1")
        .await
        .unwrap();

    // A later connection on another platform keeps the original user row
    store
        .upsert_credentials(Platform::Google, &profile("acct-2", "t2"), "u1")
        .await
        .unwrap();

    let user = store.get_user("u1").await.unwrap().unwrap();
    assert_eq!(user.email, "real@example.com");
}

#[tokio::test]
async fn test_profile_without_expiry_round_trips_as_none() {
    let store = common::test_store().await;

    let mut p = profile("acct-1", "t");
    p.expires_at = None;
    store
        .upsert_credentials(Platform::Facebook, &p, "u1")
        .await
        .unwrap();

    let loaded = store
        .get_credentials(Platform::Facebook, "u1")
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.expires_at.is_none());
}
