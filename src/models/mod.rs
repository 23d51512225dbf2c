// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod interaction;
pub mod platform;
pub mod profile;
pub mod user;

pub use interaction::{Actor, Comment, ContentItem, ContentWithInteractions, InteractionSnapshot};
pub use platform::Platform;
pub use profile::SocialProfile;
pub use user::User;
