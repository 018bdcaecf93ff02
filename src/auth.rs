// ABOUTME: JWT issuance and validation plus password hashing for marketplace accounts
// ABOUTME: Access and refresh tokens are HS256-signed and carry the user's role
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Authentication
//!
//! [`AuthManager`] signs short-lived access tokens and longer-lived refresh
//! tokens with a shared HS256 secret. Passwords are hashed with bcrypt on the
//! blocking thread pool so request handlers never stall the runtime.

use crate::constants::accounts::PASSWORD_SPECIAL_CHARACTERS;
use crate::constants::limits::MIN_PASSWORD_LENGTH;
use crate::constants::service_names::JWT_AUDIENCE;
use crate::database::UserRecord;
use crate::errors::{AppError, AppResult};
use crate::models::UserRole;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

/// Kind of JWT, checked on every validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Authorizes API requests
    Access,
    /// Exchanged for a new access token
    Refresh,
}

impl TokenType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

/// `JWT` claims for marketplace users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User email
    pub email: String,
    /// Role at issue time
    pub role: UserRole,
    /// Access or refresh
    pub token_type: TokenType,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience (who the token is intended for)
    pub aud: String,
}

/// Why a presented token was rejected
#[derive(Debug, Clone, Error)]
pub enum JwtValidationError {
    /// Past its `exp` claim
    #[error("JWT token expired at {}", .expired_at.format("%Y-%m-%d %H:%M:%S UTC"))]
    TokenExpired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },
    /// Bad signature, audience, or token type
    #[error("JWT token is invalid: {reason}")]
    TokenInvalid {
        /// Reason for invalidity
        reason: String,
    },
    /// Not a well-formed `JWT`
    #[error("JWT token is malformed: {details}")]
    TokenMalformed {
        /// Details about malformation
        details: String,
    },
}

impl From<JwtValidationError> for AppError {
    fn from(error: JwtValidationError) -> Self {
        match error {
            JwtValidationError::TokenExpired { .. } => Self::auth_expired(),
            JwtValidationError::TokenInvalid { .. } | JwtValidationError::TokenMalformed { .. } => {
                Self::auth_invalid(error.to_string())
            }
        }
    }
}

/// Identity of the caller, re-read from the database on every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// User `ID`
    pub user_id: String,
    /// User email
    pub email: String,
    /// Role as currently stored
    pub role: UserRole,
}

impl AuthenticatedUser {
    /// Whether the caller is an administrator
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Fail with `PermissionDenied` unless the caller is an administrator
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-admin callers
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::permission_denied(
                "Only administrators can perform this action.",
            ))
        }
    }
}

impl From<&UserRecord> for AuthenticatedUser {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Access and refresh token pair returned on login
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Access token
    pub access: String,
    /// Refresh token
    pub refresh: String,
}

/// Authentication manager for `JWT` tokens and password hashes
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    bcrypt_cost: u32,
}

impl AuthManager {
    /// Create a manager signing with `secret`
    #[must_use]
    pub fn new(
        secret: &[u8],
        access_lifetime_minutes: i64,
        refresh_lifetime_days: i64,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_lifetime: Duration::minutes(access_lifetime_minutes),
            refresh_lifetime: Duration::days(refresh_lifetime_days),
            bcrypt_cost,
        }
    }

    fn generate_token(&self, user: &UserRecord, token_type: TokenType) -> AppResult<String> {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };

        let claims = Claims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            token_type,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            aud: JWT_AUDIENCE.to_owned(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign JWT: {e}")))
    }

    /// Issue an access token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_access_token(&self, user: &UserRecord) -> AppResult<String> {
        self.generate_token(user, TokenType::Access)
    }

    /// Issue an access and refresh token pair for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_token_pair(&self, user: &UserRecord) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access: self.generate_token(user, TokenType::Access)?,
            refresh: self.generate_token(user, TokenType::Refresh)?,
        })
    }

    /// Validate a token's signature, audience, expiry, and type
    ///
    /// # Errors
    ///
    /// Returns a [`JwtValidationError`] describing why the token was rejected
    pub fn validate_token(
        &self,
        token: &str,
        expected: TokenType,
    ) -> Result<Claims, JwtValidationError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_audience(&[JWT_AUDIENCE]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Self::convert_jwt_error(&e))?;

        if Utc::now().timestamp() > claims.exp {
            let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
            debug!(user_id = %claims.sub, "JWT token expired at {}", expired_at.to_rfc3339());
            return Err(JwtValidationError::TokenExpired { expired_at });
        }

        if claims.token_type != expected {
            return Err(JwtValidationError::TokenInvalid {
                reason: format!("expected a {} token", expected.as_str()),
            });
        }

        Ok(claims)
    }

    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> JwtValidationError {
        use jsonwebtoken::errors::ErrorKind;
        warn!("JWT token validation failed: {e}");

        match e.kind() {
            ErrorKind::InvalidSignature => JwtValidationError::TokenInvalid {
                reason: "Token signature verification failed".into(),
            },
            ErrorKind::InvalidAudience => JwtValidationError::TokenInvalid {
                reason: "Token audience mismatch".into(),
            },
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                JwtValidationError::TokenMalformed {
                    details: "Token format is invalid".into(),
                }
            }
            _ => JwtValidationError::TokenInvalid {
                reason: format!("Token validation failed: {e}"),
            },
        }
    }

    /// Hash a password with bcrypt on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails or the blocking task panics
    pub async fn hash_password(&self, password: &str) -> AppResult<String> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
    }

    /// Check a password against a bcrypt hash on the blocking pool
    ///
    /// # Errors
    ///
    /// Returns an error if the hash is malformed or the blocking task panics
    pub async fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
            .map_err(|e| AppError::internal(format!("Password verification failed: {e}")))
    }
}

/// Generate a random 64-byte `JWT` secret
#[must_use]
pub fn generate_jwt_secret() -> [u8; 64] {
    let mut secret = [0u8; 64];
    rand::rngs::OsRng.fill_bytes(&mut secret);
    secret
}

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Basic structural email check
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

/// Enforce password complexity
///
/// # Errors
///
/// Returns `InvalidInput` naming the first unmet requirement
pub fn validate_password_strength(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::invalid_input(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long."
        )));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::invalid_input(
            "Password must contain at least one uppercase letter.",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::invalid_input(
            "Password must contain at least one lowercase letter.",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::invalid_input(
            "Password must contain at least one digit.",
        ));
    }
    if !password
        .chars()
        .any(|c| PASSWORD_SPECIAL_CHARACTERS.contains(c))
    {
        return Err(AppError::invalid_input(
            "Password must contain at least one special character.",
        ));
    }
    Ok(())
}
