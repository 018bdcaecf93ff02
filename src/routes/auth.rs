// ABOUTME: Account route handlers: registration, login, token refresh, and email verification
// ABOUTME: Also serves account and profile endpoints, with user management for administrators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Authentication and account routes
//!
//! Passwords are hashed with bcrypt on the blocking pool. Email verification
//! tokens are written to the log instead of being mailed. Administrators can
//! list every account and profile, and change roles or disable accounts.

use super::check_length;
use crate::auth::{is_valid_email, validate_password_strength, TokenType};
use crate::constants::limits::{MAX_BIO_LENGTH, MAX_LOCATION_LENGTH, MAX_PHONE_NUMBER_LENGTH};
use crate::database::{ProfileRecord, UserRecord};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::middleware::require_auth;
use crate::models::UserRole;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// User registration request
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email address
    pub email: String,
    /// Display username
    pub username: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Requested role, `STUDENT` when absent
    #[serde(default)]
    pub role: Option<String>,
    /// Password
    pub password: String,
    /// Password repeated
    pub password_confirm: String,
}

/// Registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// New user ID
    pub user_id: String,
    /// Registered email
    pub email: String,
    /// Next step for the user
    pub message: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Login response with tokens and the account
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token
    pub access: String,
    /// Refresh token
    pub refresh: String,
    /// Logged-in user
    pub user: UserInfo,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    /// Refresh token issued at login
    pub refresh: String,
}

/// Email verification query
#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    /// Verification token
    #[serde(default)]
    pub token: Option<String>,
}

/// Account update request; absent fields are unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New given name
    #[serde(default)]
    pub first_name: Option<String>,
    /// New family name
    #[serde(default)]
    pub last_name: Option<String>,
    /// New username
    #[serde(default)]
    pub username: Option<String>,
}

/// Administrator account update; absent fields are unchanged
#[derive(Debug, Deserialize)]
pub struct AdminUpdateUserRequest {
    /// New given name
    #[serde(default)]
    pub first_name: Option<String>,
    /// New family name
    #[serde(default)]
    pub last_name: Option<String>,
    /// New username
    #[serde(default)]
    pub username: Option<String>,
    /// New role
    #[serde(default)]
    pub role: Option<String>,
    /// Enable or disable the account
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Password change request
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    /// Current password
    pub old_password: String,
    /// New password
    pub new_password: String,
    /// New password repeated
    pub new_password_confirm: String,
}

/// Profile update request; absent fields are unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New biography
    #[serde(default)]
    pub bio: Option<String>,
    /// New phone number
    #[serde(default)]
    pub phone_number: Option<String>,
    /// New location
    #[serde(default)]
    pub location: Option<String>,
}

/// User information returned to clients
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// User ID
    pub id: String,
    /// Email address
    pub email: String,
    /// Username
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Given and family name
    pub full_name: String,
    /// Account role
    pub role: UserRole,
    /// Email confirmed
    pub is_verified: bool,
    /// Account enabled
    pub is_active: bool,
    /// Registration timestamp
    pub date_joined: String,
}

impl From<&UserRecord> for UserInfo {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.full_name(),
            role: user.role,
            is_verified: user.is_verified,
            is_active: user.is_active,
            date_joined: user.date_joined.clone(),
        }
    }
}

fn message(text: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "message": text }))
}

fn parse_registration_role(raw: Option<&str>) -> AppResult<UserRole> {
    let role = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse::<UserRole>)
        .transpose()?
        .unwrap_or_default();

    if role.is_self_assignable() {
        Ok(role)
    } else {
        Err(AppError::invalid_input(
            "Role must be one of STUDENT, STARTUP, or MENTOR.",
        ))
    }
}

fn validate_new_password(password: &str, confirm: &str) -> AppResult<()> {
    if password != confirm {
        return Err(AppError::invalid_input("Password fields didn't match."));
    }
    validate_password_strength(password)
}

fn blank_username(username: Option<&str>) -> AppResult<()> {
    if username.is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::missing_field("username", "Username cannot be blank."));
    }
    Ok(())
}

// ============================================================================
// Routes
// ============================================================================

/// Authentication and account routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication and account routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::register))
            .route("/api/auth/login", post(Self::login))
            .route("/api/auth/refresh", post(Self::refresh))
            .route("/api/auth/verify-email", get(Self::verify_email))
            .route("/api/users/me", get(Self::me).put(Self::update_me))
            .route("/api/users/me/change-password", post(Self::change_password))
            .route(
                "/api/users/me/profile",
                get(Self::get_profile).put(Self::update_profile),
            )
            .route("/api/users", get(Self::list_users))
            .route(
                "/api/users/:id",
                get(Self::get_user).put(Self::admin_update_user),
            )
            .route("/api/profiles", get(Self::list_profiles))
            .with_state(resources)
    }

    /// Register a new account
    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let email = request.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::invalid_format("Enter a valid email address."));
        }
        if request.username.trim().is_empty() {
            return Err(AppError::missing_field("username", "Username is required."));
        }
        let role = parse_registration_role(request.role.as_deref())?;
        validate_new_password(&request.password, &request.password_confirm)?;

        if resources.database.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::already_exists(
                "A user with this email already exists.",
            ));
        }

        let password_hash = resources.auth_manager.hash_password(&request.password).await?;
        let user = resources
            .database
            .create_user(
                &email,
                request.username.trim(),
                request.first_name.trim(),
                request.last_name.trim(),
                role,
                &password_hash,
            )
            .await?;

        let token = resources.database.create_verification_token(&user.id).await?;
        info!(
            user_id = %user.id,
            email = %user.email,
            role = %user.role,
            verification_token = %token,
            "New user registered"
        );

        let response = RegisterResponse {
            user_id: user.id,
            email: user.email,
            message: "User registered successfully. Please check your email for verification."
                .to_owned(),
        };
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Exchange credentials for a token pair
    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let email = request.email.trim();
        let Some(user) = resources.database.get_user_by_email(email).await? else {
            AppLogger::log_security_event("login_unknown_email", "Login for unknown account", None);
            return Err(AppError::auth_invalid("Invalid email or password."));
        };

        if !resources
            .auth_manager
            .verify_password(&request.password, &user.password_hash)
            .await?
        {
            AppLogger::log_auth_event(&user.id, "login", false, Some("bad password"));
            return Err(AppError::auth_invalid("Invalid email or password."));
        }
        if !user.is_active {
            AppLogger::log_auth_event(&user.id, "login", false, Some("account disabled"));
            return Err(AppError::auth_invalid("User account is disabled."));
        }

        let tokens = resources.auth_manager.generate_token_pair(&user)?;
        AppLogger::log_auth_event(&user.id, "login", true, None);

        Ok(Json(LoginResponse {
            access: tokens.access,
            refresh: tokens.refresh,
            user: UserInfo::from(&user),
        })
        .into_response())
    }

    /// Issue a new access token from a refresh token
    async fn refresh(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RefreshTokenRequest>,
    ) -> Result<Response, AppError> {
        let claims = resources
            .auth_manager
            .validate_token(&request.refresh, TokenType::Refresh)?;

        let user = resources
            .database
            .get_user(&claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::auth_invalid("User not found or disabled."))?;

        let access = resources.auth_manager.generate_access_token(&user)?;
        AppLogger::log_auth_event(&user.id, "token_refresh", true, None);
        Ok(Json(serde_json::json!({ "access": access })).into_response())
    }

    async fn verify_email(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<VerifyEmailQuery>,
    ) -> Result<Response, AppError> {
        let token = query
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                AppError::missing_field("token", "Verification token is required.")
            })?;

        let user_id = resources.database.verify_email_token(token).await?;
        info!(user_id = %user_id, "Email verified");
        Ok(message("Email verified successfully").into_response())
    }

    async fn me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let user = resources
            .database
            .get_user(&auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        Ok(Json(UserInfo::from(&user)).into_response())
    }

    async fn update_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateUserRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        blank_username(request.username.as_deref())?;

        let user = resources
            .database
            .update_user_names(
                &auth.user_id,
                request.first_name.as_deref().map(str::trim),
                request.last_name.as_deref().map(str::trim),
                request.username.as_deref().map(str::trim),
            )
            .await?;
        Ok(Json(UserInfo::from(&user)).into_response())
    }

    async fn change_password(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChangePasswordRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let user = resources
            .database
            .get_user(&auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        if !resources
            .auth_manager
            .verify_password(&request.old_password, &user.password_hash)
            .await?
        {
            AppLogger::log_auth_event(&user.id, "change_password", false, Some("bad password"));
            return Err(AppError::invalid_input("Old password is incorrect."));
        }
        validate_new_password(&request.new_password, &request.new_password_confirm)?;

        let password_hash = resources
            .auth_manager
            .hash_password(&request.new_password)
            .await?;
        resources
            .database
            .update_password_hash(&user.id, &password_hash)
            .await?;

        AppLogger::log_auth_event(&user.id, "change_password", true, None);
        Ok(message("Password changed successfully").into_response())
    }

    async fn get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let profile: ProfileRecord = resources.database.get_profile(&auth.user_id).await?;
        Ok(Json(profile).into_response())
    }

    async fn update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        check_length("bio", request.bio.as_deref(), MAX_BIO_LENGTH)?;
        check_length(
            "phone_number",
            request.phone_number.as_deref(),
            MAX_PHONE_NUMBER_LENGTH,
        )?;
        check_length("location", request.location.as_deref(), MAX_LOCATION_LENGTH)?;

        let profile = resources
            .database
            .update_profile(
                &auth.user_id,
                request.bio.as_deref(),
                request.phone_number.as_deref(),
                request.location.as_deref(),
            )
            .await?;
        Ok(Json(profile).into_response())
    }

    /// Every account (administrators only)
    async fn list_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        auth.require_admin()?;

        let users = resources.database.list_users().await?;
        let users: Vec<UserInfo> = users.iter().map(UserInfo::from).collect();
        Ok(Json(users).into_response())
    }

    /// One account; others only see their own
    async fn get_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        if !auth.is_admin() && auth.user_id != user_id {
            return Err(AppError::not_found("User"));
        }

        let user = resources
            .database
            .get_user(&user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        Ok(Json(UserInfo::from(&user)).into_response())
    }

    /// Change names, role or active flag of any account (administrators only)
    async fn admin_update_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(user_id): Path<String>,
        Json(request): Json<AdminUpdateUserRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        auth.require_admin()?;
        blank_username(request.username.as_deref())?;
        let role = request
            .role
            .as_deref()
            .map(|raw| raw.trim().parse::<UserRole>())
            .transpose()?;

        if auth.user_id == user_id
            && (request.is_active == Some(false) || role.is_some_and(|r| r != UserRole::Admin))
        {
            warn!(user_id = %auth.user_id, "Rejected administrator self-demotion");
            return Err(AppError::invalid_input(
                "Administrators cannot disable or demote their own account.",
            ));
        }

        resources
            .database
            .update_user_names(
                &user_id,
                request.first_name.as_deref().map(str::trim),
                request.last_name.as_deref().map(str::trim),
                request.username.as_deref().map(str::trim),
            )
            .await?;
        if let Some(role) = role {
            resources.database.set_user_role(&user_id, role).await?;
        }
        if let Some(is_active) = request.is_active {
            resources.database.set_user_active(&user_id, is_active).await?;
        }

        let user = resources
            .database
            .get_user(&user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        info!(
            user_id = %user.id,
            admin_id = %auth.user_id,
            role = %user.role,
            is_active = user.is_active,
            "User updated by administrator"
        );
        Ok(Json(UserInfo::from(&user)).into_response())
    }

    /// Every profile (administrators only)
    async fn list_profiles(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        auth.require_admin()?;
        let profiles = resources.database.list_profiles().await?;
        Ok(Json(profiles).into_response())
    }
}
