// SPDX-License-Identifier: MIT

//! Database layer (SQLite via sqlx).

pub mod credentials;

pub use credentials::CredentialStore;
