// SPDX-License-Identifier: MIT

//! Credential lifecycle: persistence with an in-memory mirror, and the
//! expiry monitor that refreshes tokens approaching their expiry.
//!
//! The mirror keeps connected accounts usable through transient database
//! trouble: saves always land in the mirror even if the database write
//! fails, and loads fall back to the mirror when the database read errors.

use crate::db::CredentialStore;
use crate::error::AppError;
use crate::models::{Platform, SocialProfile};
use crate::providers::ProviderSet;
use dashmap::DashMap;
use std::sync::Arc;

/// Tokens expiring within this many days get refreshed on access.
const REFRESH_HORIZON_DAYS: i64 = 7;

/// Stored credentials plus the in-memory mirror.
#[derive(Clone)]
pub struct CredentialService {
    store: CredentialStore,
    mirror: Arc<DashMap<(Platform, String), SocialProfile>>,
}

impl CredentialService {
    pub fn new(store: CredentialStore) -> Self {
        Self {
            store,
            mirror: Arc::new(DashMap::new()),
        }
    }

    /// Persist credentials. The mirror is updated first so the account
    /// stays connected even when the database write fails; the failure is
    /// still surfaced to the caller.
    pub async fn save(
        &self,
        platform: Platform,
        profile: &SocialProfile,
        user_id: &str,
    ) -> Result<(), AppError> {
        self.mirror
            .insert((platform, user_id.to_string()), profile.clone());

        self.store
            .upsert_credentials(platform, profile, user_id)
            .await
    }

    /// Load credentials, falling back to the mirror on a database error.
    pub async fn load(
        &self,
        platform: Platform,
        user_id: &str,
    ) -> Result<Option<SocialProfile>, AppError> {
        match self.store.get_credentials(platform, user_id).await {
            Ok(found) => Ok(found),
            Err(e) => {
                tracing::warn!(
                    platform = %platform,
                    error = %e,
                    "Credential read failed, consulting in-memory mirror"
                );
                Ok(self
                    .mirror
                    .get(&(platform, user_id.to_string()))
                    .map(|entry| entry.clone()))
            }
        }
    }

    /// Remove stored credentials. Returns whether anything was removed;
    /// a database error downgrades to `false` after clearing the mirror.
    pub async fn remove(&self, platform: Platform, user_id: &str) -> bool {
        let mirrored = self
            .mirror
            .remove(&(platform, user_id.to_string()))
            .is_some();

        match self.store.delete_credentials(platform, user_id).await {
            Ok(deleted) => deleted || mirrored,
            Err(e) => {
                tracing::warn!(platform = %platform, error = %e, "Credential delete failed");
                mirrored
            }
        }
    }

    /// Load credentials and refresh the token if it expires within the
    /// horizon. Only Instagram long-lived tokens are refreshable here,
    /// using the app credentials embedded in the stored record. Refresh
    /// failure is non-fatal: the original credentials come back.
    pub async fn ensure_fresh(
        &self,
        providers: &ProviderSet,
        platform: Platform,
        user_id: &str,
    ) -> Result<Option<SocialProfile>, AppError> {
        let Some(profile) = self.load(platform, user_id).await? else {
            return Ok(None);
        };

        if !profile.expires_within_days(REFRESH_HORIZON_DAYS) {
            return Ok(Some(profile));
        }

        if platform != Platform::Instagram {
            tracing::debug!(
                platform = %platform,
                "Token near expiry but not refreshable here"
            );
            return Ok(Some(profile));
        }

        let (Some(app_id), Some(app_secret)) = (&profile.app_id, &profile.app_secret) else {
            tracing::warn!("Instagram token near expiry but record carries no app credentials");
            return Ok(Some(profile));
        };

        match providers
            .instagram
            .refresh_token(&profile.access_token, app_id, app_secret)
            .await
        {
            Ok((access_token, expires_at)) => {
                let refreshed = SocialProfile {
                    access_token,
                    expires_at,
                    ..profile.clone()
                };
                tracing::info!(user_id, "Instagram token refreshed");

                // Persist best-effort; the refreshed token is good even if
                // the write fails.
                if let Err(e) = self.save(platform, &refreshed, user_id).await {
                    tracing::warn!(error = %e, "Failed to persist refreshed token");
                }
                Ok(Some(refreshed))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Instagram token refresh failed");
                Ok(Some(profile))
            }
        }
    }
}
