// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Anti-forgery state failed verification. The flow must abort
    /// before any token exchange.
    #[error("OAuth state verification failed")]
    StateMismatch,

    /// The authorization code was already exchanged once. Codes are
    /// single-use; the caller should start a fresh authorization.
    #[error("Authorization code already used")]
    CodeConsumed,

    /// Instagram only: none of the user's pages has a linked
    /// business/creator account.
    #[error("No Instagram business account linked to any page")]
    NoBusinessAccount,

    #[error("Provider API error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable snake_case code for this error, also used as the `error`
    /// query parameter on OAuth callback redirects.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::BadRequest(_) => "bad_request",
            AppError::StateMismatch => "state_mismatch",
            AppError::CodeConsumed => "code_already_used",
            AppError::NoBusinessAccount => "no_business_account",
            AppError::Provider(_) => "provider_error",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, Some(msg.clone())),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Some(msg.clone())),
            AppError::StateMismatch => (
                StatusCode::BAD_REQUEST,
                Some(
                    "Authorization state is invalid or expired. Restart the connection flow."
                        .to_string(),
                ),
            ),
            AppError::CodeConsumed => (
                StatusCode::CONFLICT,
                Some(
                    "This authorization code was already exchanged. Reconnect the account to \
                     get a new one."
                        .to_string(),
                ),
            ),
            AppError::NoBusinessAccount => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(
                    "None of your Facebook pages has a linked Instagram business or creator \
                     account. Convert the Instagram account to a professional account, link it \
                     to a page, then reconnect."
                        .to_string(),
                ),
            ),
            AppError::Provider(msg) => (StatusCode::BAD_GATEWAY, Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::StateMismatch.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::CodeConsumed.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::NoBusinessAccount.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Provider("boom".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
