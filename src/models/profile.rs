// SPDX-License-Identifier: MIT

//! Normalized profile shape shared by every platform adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The common profile every adapter's `complete` call produces, regardless
/// of provider-specific response shape. This is also the wire shape of the
/// credential API (camelCase, epoch-millisecond expiry).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialProfile {
    /// Platform-assigned account ID
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Bearer token for downstream API calls
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Absolute expiry; absent means non-expiring or unknown lifetime
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    /// App credentials embedded so a later refresh exchange can run from
    /// the stored record alone (Instagram long-lived tokens).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_secret: Option<String>,
}

impl SocialProfile {
    /// Whether the token expires within the given number of days.
    /// Profiles without an expiry never need a refresh.
    pub fn expires_within_days(&self, days: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - Utc::now() < chrono::Duration::days(days),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(expires_at: Option<DateTime<Utc>>) -> SocialProfile {
        SocialProfile {
            id: "42".to_string(),
            name: "Test Account".to_string(),
            username: Some("test".to_string()),
            email: None,
            picture: None,
            access_token: "tok".to_string(),
            refresh_token: None,
            expires_at,
            app_id: None,
            app_secret: None,
        }
    }

    #[test]
    fn test_expiry_horizon() {
        assert!(!profile(None).expires_within_days(7));
        assert!(!profile(Some(Utc::now() + chrono::Duration::days(30))).expires_within_days(7));
        assert!(profile(Some(Utc::now() + chrono::Duration::days(3))).expires_within_days(7));
        assert!(profile(Some(Utc::now() - chrono::Duration::days(1))).expires_within_days(7));
    }

    #[test]
    fn test_wire_shape_is_camel_case_millis() {
        let expires = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let json = serde_json::to_value(profile(Some(expires))).unwrap();
        assert_eq!(json["accessToken"], "tok");
        assert_eq!(json["expiresAt"], 1_700_000_000_000_i64);
        assert!(json.get("refreshToken").is_none());
    }

    #[test]
    fn test_deserializes_original_wire_form() {
        let profile: SocialProfile = serde_json::from_str(
            r#"{"id":"1","name":"N","accessToken":"t","expiresAt":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(profile.access_token, "t");
        assert!(profile.expires_at.is_some());
    }
}
