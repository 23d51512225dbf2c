// SPDX-License-Identifier: MIT

//! In-memory mirror fallback tests: the credential service keeps accounts
//! usable when the backing store stops answering.

mod common;

use social_pulse::models::{Platform, SocialProfile};
use social_pulse::services::CredentialService;

fn profile(token: &str) -> SocialProfile {
    SocialProfile {
        id: "acct-1".to_string(),
        name: "Account".to_string(),
        username: None,
        email: None,
        picture: None,
        access_token: token.to_string(),
        refresh_token: None,
        expires_at: None,
        app_id: None,
        app_secret: None,
    }
}

#[tokio::test]
async fn test_load_falls_back_to_mirror_when_store_fails() {
    let store = common::test_store().await;
    let service = CredentialService::new(store.clone());

    service
        .save(Platform::Facebook, &profile("tok-1"), "u1")
        .await
        .unwrap();

    // Kill the store; the mirrored copy must still answer loads
    store.close().await;
    let loaded = service
        .load(Platform::Facebook, "u1")
        .await
        .unwrap()
        .expect("mirror serves the profile");
    assert_eq!(loaded.access_token, "tok-1");
}

#[tokio::test]
async fn test_mirror_misses_stay_absent_when_store_fails() {
    let store = common::test_store().await;
    let service = CredentialService::new(store.clone());

    store.close().await;
    let loaded = service.load(Platform::Twitter, "nobody").await.unwrap();
    assert!(loaded.is_none());
}

#[tokio::test]
async fn test_save_surfaces_store_failure_but_keeps_mirror() {
    let store = common::test_store().await;
    let service = CredentialService::new(store.clone());
    store.close().await;

    // The write fails loudly...
    let result = service.save(Platform::Linkedin, &profile("tok-2"), "u1").await;
    assert!(result.is_err());

    // ...yet the connection is still usable from the mirror
    let loaded = service
        .load(Platform::Linkedin, "u1")
        .await
        .unwrap()
        .expect("mirror holds the failed save");
    assert_eq!(loaded.access_token, "tok-2");
}

#[tokio::test]
async fn test_remove_clears_mirror_despite_store_failure() {
    let store = common::test_store().await;
    let service = CredentialService::new(store.clone());

    service
        .save(Platform::Google, &profile("tok-3"), "u1")
        .await
        .unwrap();
    store.close().await;

    // The mirrored entry counts as removed even though the delete errored
    assert!(service.remove(Platform::Google, "u1").await);
    assert!(service.load(Platform::Google, "u1").await.unwrap().is_none());
}
