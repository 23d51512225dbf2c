// SPDX-License-Identifier: MIT

//! Social-Pulse: OAuth credential lifecycle for social platform accounts
//!
//! This crate provides the backend API for connecting Facebook, Instagram,
//! Twitter, LinkedIn, and Google accounts, keeping their tokens stored and
//! fresh, and reading back content with engagement snapshots.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod providers;
pub mod routes;
pub mod services;

use config::Config;
use oauth::StateManager;
use providers::ProviderSet;
use services::CredentialService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub credentials: CredentialService,
    pub providers: ProviderSet,
    pub oauth_state: StateManager,
}
