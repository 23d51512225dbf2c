// SPDX-License-Identifier: MIT

//! User model backing the credential table's foreign key.

use serde::{Deserialize, Serialize};

/// Dashboard user owning a set of connected social accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Placeholder `{id}@example.com` when the connecting profile has none
    pub email: String,
    pub name: String,
    /// When the user row was created (RFC 3339)
    pub created_at: String,
}
