// SPDX-License-Identifier: MIT

//! Shared response checking for provider API calls.

use crate::error::AppError;
use serde::de::DeserializeOwned;

/// Wrap a transport-level reqwest failure.
pub fn request_failed(context: &str, err: &reqwest::Error) -> AppError {
    AppError::Provider(format!("{context}: {err}"))
}

/// Check response status and parse the JSON body.
pub async fn check_json<T: DeserializeOwned>(
    context: &str,
    response: reqwest::Response,
) -> Result<T, AppError> {
    let response = check_status(context, response).await?;
    response
        .json()
        .await
        .map_err(|e| AppError::Provider(format!("{context}: JSON parse error: {e}")))
}

/// Check response status, mapping OAuth error bodies onto the taxonomy.
async fn check_status(
    context: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, AppError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    // Authorization codes are single-use. Facebook reports "This
    // authorization code has been used"; the OAuth2 providers report
    // error=invalid_grant. Surface both distinctly so the caller prompts
    // a fresh authorization instead of retrying.
    if body.contains("has been used") || body.contains("invalid_grant") {
        tracing::warn!(context, status = %status, "Authorization grant rejected as consumed");
        return Err(AppError::CodeConsumed);
    }

    Err(AppError::Provider(format!("{context}: HTTP {status}: {body}")))
}
