// SPDX-License-Identifier: MIT

//! Relational credential store.
//!
//! One row per (platform, account_id) in `social_accounts`, foreign-keyed
//! to a `users` row. A reconnection for the same external account updates
//! the existing row in place; no history is retained.

use crate::error::AppError;
use crate::models::{Platform, SocialProfile};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS social_accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        platform TEXT NOT NULL,
        account_id TEXT NOT NULL,
        display_name TEXT NOT NULL,
        username TEXT,
        email TEXT,
        picture TEXT,
        access_token TEXT NOT NULL,
        refresh_token TEXT,
        expires_at TEXT,
        app_id TEXT,
        app_secret TEXT,
        user_id TEXT NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(platform, account_id)
    )",
    "CREATE INDEX IF NOT EXISTS idx_social_accounts_platform_user
        ON social_accounts(platform, user_id)",
];

/// SQLite-backed credential store.
#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    /// Connect and create the schema if it does not exist.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        // An in-memory database exists per connection, so it must not be
        // pooled beyond one.
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database: {e}")))?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| AppError::Database(format!("Schema creation failed: {e}")))?;
        }

        tracing::info!(url = database_url, "Connected to credential store");
        Ok(Self { pool })
    }

    /// Close the underlying pool. Queries issued afterwards fail with
    /// `AppError::Database`; the service layer absorbs that through its
    /// in-memory mirror.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ─── Credential Operations ───────────────────────────────────

    /// Upsert a credential record by (platform, account_id).
    ///
    /// An existing record for the same external account gets its mutable
    /// fields updated and `updated_at` touched; otherwise a new record is
    /// inserted, creating the backing user row first if needed.
    pub async fn upsert_credentials(
        &self,
        platform: Platform,
        profile: &SocialProfile,
        user_id: &str,
    ) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        let expires_at = profile.expires_at.map(|dt| dt.to_rfc3339());

        let existing: Option<i64> = sqlx::query(
            "SELECT id FROM social_accounts WHERE platform = ? AND account_id = ?",
        )
        .bind(platform.as_str())
        .bind(&profile.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .map(|row| row.get("id"));

        if let Some(row_id) = existing {
            sqlx::query(
                "UPDATE social_accounts SET
                    display_name = ?, username = ?, email = ?, picture = ?,
                    access_token = ?, refresh_token = ?, expires_at = ?,
                    app_id = ?, app_secret = ?, updated_at = ?
                 WHERE id = ?",
            )
            .bind(&profile.name)
            .bind(&profile.username)
            .bind(&profile.email)
            .bind(&profile.picture)
            .bind(&profile.access_token)
            .bind(&profile.refresh_token)
            .bind(&expires_at)
            .bind(&profile.app_id)
            .bind(&profile.app_secret)
            .bind(&now)
            .bind(row_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        } else {
            self.ensure_user(user_id, profile).await?;

            sqlx::query(
                "INSERT INTO social_accounts
                    (platform, account_id, display_name, username, email, picture,
                     access_token, refresh_token, expires_at, app_id, app_secret,
                     user_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(platform.as_str())
            .bind(&profile.id)
            .bind(&profile.name)
            .bind(&profile.username)
            .bind(&profile.email)
            .bind(&profile.picture)
            .bind(&profile.access_token)
            .bind(&profile.refresh_token)
            .bind(&expires_at)
            .bind(&profile.app_id)
            .bind(&profile.app_secret)
            .bind(user_id)
            .bind(&now)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        Ok(())
    }

    /// Get the most recent credential record for (platform, user).
    pub async fn get_credentials(
        &self,
        platform: Platform,
        user_id: &str,
    ) -> Result<Option<SocialProfile>, AppError> {
        let row = sqlx::query(
            "SELECT account_id, display_name, username, email, picture,
                    access_token, refresh_token, expires_at, app_id, app_secret
             FROM social_accounts
             WHERE platform = ? AND user_id = ?
             ORDER BY updated_at DESC
             LIMIT 1",
        )
        .bind(platform.as_str())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let Some(row) = row else { return Ok(None) };

        let expires_at: Option<String> = row.get("expires_at");
        let expires_at = expires_at.as_deref().and_then(parse_rfc3339);

        Ok(Some(SocialProfile {
            id: row.get("account_id"),
            name: row.get("display_name"),
            username: row.get("username"),
            email: row.get("email"),
            picture: row.get("picture"),
            access_token: row.get("access_token"),
            refresh_token: row.get("refresh_token"),
            expires_at,
            app_id: row.get("app_id"),
            app_secret: row.get("app_secret"),
        }))
    }

    /// Delete the credential record for (platform, user).
    /// Returns whether a deletion occurred.
    pub async fn delete_credentials(
        &self,
        platform: Platform,
        user_id: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM social_accounts WHERE platform = ? AND user_id = ?",
        )
        .bind(platform.as_str())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create the user row if it does not exist, defaulting email/name to
    /// placeholders when the connecting profile lacks them.
    async fn ensure_user(&self, user_id: &str, profile: &SocialProfile) -> Result<(), AppError> {
        let email = profile
            .email
            .clone()
            .unwrap_or_else(|| format!("{user_id}@example.com"));
        let name = if profile.name.is_empty() {
            "User".to_string()
        } else {
            profile.name.clone()
        };

        sqlx::query(
            "INSERT INTO users (id, email, name, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO NOTHING",
        )
        .bind(user_id)
        .bind(&email)
        .bind(&name)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Look up a user row by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<crate::models::User>, AppError> {
        let row = sqlx::query("SELECT id, email, name, created_at FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(|row| crate::models::User {
            id: row.get("id"),
            email: row.get("email"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        }))
    }
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
