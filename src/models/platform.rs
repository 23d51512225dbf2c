// SPDX-License-Identifier: MIT

//! The closed set of supported social platforms.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform discriminator. All adapter dispatch goes through this enum;
/// there is no per-platform duck typing anywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
    Linkedin,
    Google,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Google,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Google => "google",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "facebook" => Ok(Platform::Facebook),
            "instagram" => Ok(Platform::Instagram),
            "twitter" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            "google" => Ok(Platform::Google),
            other => Err(crate::error::AppError::BadRequest(format!(
                "Unknown platform: {other}"
            ))),
        }
    }
}
