// SPDX-License-Identifier: MIT

//! Platform adapters.
//!
//! One adapter per platform, all sharing a single HTTP client, with
//! [`ProviderSet`] as the dispatch point. The platform set is closed, so
//! dispatch is a plain match on [`Platform`] rather than trait objects.

pub mod extract;
pub mod facebook;
pub mod google;
pub mod http;
pub mod instagram;
pub mod linkedin;
pub mod twitter;

use crate::config::AppCredentials;
use crate::error::AppError;
use crate::models::{ContentItem, InteractionSnapshot, Platform, SocialProfile};

pub use facebook::FacebookProvider;
pub use google::GoogleProvider;
pub use instagram::InstagramProvider;
pub use linkedin::LinkedinProvider;
pub use twitter::TwitterProvider;

/// Union required scopes into the caller's requested ones, preserving
/// order and dropping duplicates.
pub fn union_scopes(required: &[&str], requested: &[String]) -> Vec<String> {
    let mut scopes: Vec<String> = required.iter().map(|s| s.to_string()).collect();
    for scope in requested {
        if !scopes.iter().any(|s| s == scope) {
            scopes.push(scope.clone());
        }
    }
    scopes
}

/// Scopes requested when the caller doesn't ask for any.
pub fn default_scopes(platform: Platform) -> Vec<String> {
    let scopes: &[&str] = match platform {
        Platform::Facebook => &["public_profile", "email", "user_posts"],
        // The other adapters union their required scopes in themselves.
        Platform::Instagram | Platform::Twitter | Platform::Linkedin | Platform::Google => &[],
    };
    scopes.iter().map(|s| s.to_string()).collect()
}

/// All five adapters behind one dispatch surface.
#[derive(Clone)]
pub struct ProviderSet {
    pub facebook: FacebookProvider,
    pub instagram: InstagramProvider,
    pub twitter: TwitterProvider,
    pub linkedin: LinkedinProvider,
    pub google: GoogleProvider,
}

impl ProviderSet {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            facebook: FacebookProvider::new(http.clone()),
            instagram: InstagramProvider::new(http.clone()),
            twitter: TwitterProvider::new(http.clone()),
            linkedin: LinkedinProvider::new(http.clone()),
            google: GoogleProvider::new(http),
        }
    }

    /// Authorization URL for a platform. The PKCE verifier is threaded to
    /// the adapters but only Twitter embeds it.
    pub fn authorize_url(
        &self,
        platform: Platform,
        app: &AppCredentials,
        redirect_uri: &str,
        scopes: &[String],
        state: &str,
        pkce_verifier: &str,
    ) -> String {
        match platform {
            Platform::Facebook => self
                .facebook
                .authorize_url(&app.app_id, redirect_uri, scopes, state),
            Platform::Instagram => self
                .instagram
                .authorize_url(&app.app_id, redirect_uri, scopes, state),
            Platform::Twitter => {
                self.twitter
                    .authorize_url(&app.app_id, redirect_uri, scopes, state, pkce_verifier)
            }
            Platform::Linkedin => self
                .linkedin
                .authorize_url(&app.app_id, redirect_uri, scopes, state),
            Platform::Google => self
                .google
                .authorize_url(&app.app_id, redirect_uri, scopes, state),
        }
    }

    /// Run a platform's token exchange and profile assembly.
    pub async fn complete(
        &self,
        platform: Platform,
        app: &AppCredentials,
        code: &str,
        redirect_uri: &str,
        pkce_verifier: &str,
    ) -> Result<SocialProfile, AppError> {
        match platform {
            Platform::Facebook => self.facebook.complete(app, code, redirect_uri).await,
            Platform::Instagram => self.instagram.complete(app, code, redirect_uri).await,
            Platform::Twitter => {
                self.twitter
                    .complete(app, code, redirect_uri, pkce_verifier)
                    .await
            }
            Platform::Linkedin => self.linkedin.complete(app, code, redirect_uri).await,
            Platform::Google => self.google.complete(app, code, redirect_uri).await,
        }
    }

    /// List a connected account's content.
    pub async fn list_content(
        &self,
        platform: Platform,
        profile: &SocialProfile,
    ) -> Result<Vec<ContentItem>, AppError> {
        match platform {
            Platform::Facebook => self.facebook.list_posts(profile).await,
            Platform::Instagram => self.instagram.list_media(profile).await,
            Platform::Twitter => self.twitter.list_tweets(profile).await,
            Platform::Linkedin => self.linkedin.list_posts(profile).await,
            Platform::Google => self.google.list_content(),
        }
    }

    /// Engagement snapshot for one content item. Best-effort everywhere;
    /// Google has no content so the snapshot is empty.
    pub async fn interactions(
        &self,
        platform: Platform,
        profile: &SocialProfile,
        item: &ContentItem,
    ) -> InteractionSnapshot {
        match platform {
            Platform::Facebook => self.facebook.post_interactions(profile, item).await,
            Platform::Instagram => self.instagram.media_interactions(profile, item).await,
            Platform::Twitter => self.twitter.tweet_interactions(profile, item).await,
            Platform::Linkedin => self.linkedin.post_interactions(profile, item).await,
            Platform::Google => InteractionSnapshot::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_scopes_dedups_preserving_order() {
        let merged = union_scopes(
            &["tweet.read", "users.read"],
            &["offline.access".to_string(), "tweet.read".to_string()],
        );
        assert_eq!(merged, vec!["tweet.read", "users.read", "offline.access"]);
    }

    #[test]
    fn test_union_scopes_empty_request() {
        assert_eq!(union_scopes(&["a"], &[]), vec!["a"]);
    }

    #[test]
    fn test_default_scopes_facebook() {
        assert_eq!(
            default_scopes(Platform::Facebook),
            vec!["public_profile", "email", "user_posts"]
        );
        assert!(default_scopes(Platform::Google).is_empty());
    }
}
