// ABOUTME: Bearer token authentication for marketplace HTTP handlers
// ABOUTME: Validates access tokens and re-reads the user so role and active flag are current
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::auth::{AuthenticatedUser, TokenType};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::resources::ServerResources;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::Span;

/// Extract the token from an `Authorization: Bearer <token>` header
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authenticate_token(
    token: &str,
    resources: &ServerResources,
) -> AppResult<AuthenticatedUser> {
    let claims = resources
        .auth_manager
        .validate_token(token, TokenType::Access)?;

    let user = resources
        .database
        .get_user(&claims.sub)
        .await?
        .ok_or_else(|| AppError::auth_invalid("User not found"))?;

    if !user.is_active {
        AppLogger::log_security_event(
            "inactive_user_token",
            "Token used by inactive account",
            Some(&user.id),
        );
        return Err(AppError::auth_invalid("User account is disabled."));
    }

    Span::current().record("user_id", user.id.as_str());
    Ok(AuthenticatedUser::from(&user))
}

/// Require a valid access token
///
/// # Errors
///
/// Returns `AuthRequired` when no token is sent, `AuthExpired` or
/// `AuthInvalid` when it does not validate, and `AuthInvalid` when the user
/// no longer exists or is inactive
pub async fn require_auth(
    headers: &HeaderMap,
    resources: &ServerResources,
) -> AppResult<AuthenticatedUser> {
    let token = bearer_token(headers).ok_or_else(AppError::auth_required)?;
    authenticate_token(token, resources).await
}

/// Authenticate when a token is sent; anonymous otherwise
///
/// A token that is present but invalid is still rejected.
///
/// # Errors
///
/// Returns the same errors as [`require_auth`] for a supplied token
pub async fn optional_auth(
    headers: &HeaderMap,
    resources: &ServerResources,
) -> AppResult<Option<AuthenticatedUser>> {
    match bearer_token(headers) {
        Some(token) => authenticate_token(token, resources).await.map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());
    }
}
