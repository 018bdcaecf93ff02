// ABOUTME: User account, profile, and email verification token storage
// ABOUTME: Users and their empty profile are created together in one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::{now_timestamp, Database};
use crate::constants::accounts::{EMAIL_VERIFICATION_TOKEN_LENGTH, EMAIL_VERIFICATION_TTL_HOURS};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::models::UserRole;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Stored user account
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    /// User ID
    pub id: String,
    /// Unique email address
    pub email: String,
    /// Display username
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Account role
    pub role: UserRole,
    /// Email address confirmed
    pub is_verified: bool,
    /// Account enabled
    pub is_active: bool,
    /// Registration timestamp
    pub date_joined: String,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl UserRecord {
    /// First and last name joined with a space
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// Stored user profile
#[derive(Debug, Clone, Serialize)]
pub struct ProfileRecord {
    /// Owning user ID
    pub user_id: String,
    /// Free-form biography
    pub bio: String,
    /// Contact number
    pub phone_number: String,
    /// City or region
    pub location: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

fn row_to_user(row: &SqliteRow) -> AppResult<UserRecord> {
    let role: String = row.get("role");
    Ok(UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        role: role.parse()?,
        is_verified: row.get("is_verified"),
        is_active: row.get("is_active"),
        date_joined: row.get("date_joined"),
        password_hash: row.get("password_hash"),
    })
}

fn row_to_profile(row: &SqliteRow) -> ProfileRecord {
    ProfileRecord {
        user_id: row.get("user_id"),
        bio: row.get("bio"),
        phone_number: row.get("phone_number"),
        location: row.get("location"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const USER_COLUMNS: &str = "id, email, username, first_name, last_name, role, is_verified, \
                            is_active, date_joined, password_hash";

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                username TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'STUDENT' CHECK (role IN ('STUDENT', 'STARTUP', 'MENTOR', 'ADMIN')),
                is_verified BOOLEAN NOT NULL DEFAULT 0,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                date_joined TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS user_profiles (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                bio TEXT NOT NULL DEFAULT '',
                phone_number TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS email_verification_tokens (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                token TEXT NOT NULL UNIQUE,
                is_used BOOLEAN NOT NULL DEFAULT 0,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create a user together with an empty profile
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken, or a database error
    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        first_name: &str,
        last_name: &str,
        role: UserRole,
        password_hash: &str,
    ) -> AppResult<UserRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();

        let mut guard = self.begin_write().await?;

        sqlx::query(
            r"
            INSERT INTO users (id, email, username, first_name, last_name, password_hash, role, date_joined, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(&id)
        .bind(email)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(&now)
        .execute(guard.executor()?)
        .await
        .map_err(|e| {
            let err = AppError::from(e);
            if err.code == ErrorCode::ResourceAlreadyExists {
                AppError::already_exists("A user with this email already exists.")
            } else {
                err
            }
        })?;

        sqlx::query(
            r"
            INSERT INTO user_profiles (user_id, created_at, updated_at)
            VALUES ($1, $2, $2)
            ",
        )
        .bind(&id)
        .bind(&now)
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to create profile: {e}")))?;

        guard.commit().await?;

        Ok(UserRecord {
            id,
            email: email.to_owned(),
            username: username.to_owned(),
            first_name: first_name.to_owned(),
            last_name: last_name.to_owned(),
            role,
            is_verified: false,
            is_active: true,
            date_joined: now,
            password_hash: password_hash.to_owned(),
        })
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_user(&self, user_id: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Get a user by email, case-insensitively
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 COLLATE NOCASE"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user by email: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Update name fields; `None` leaves a field unchanged
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist
    pub async fn update_user_names(
        &self,
        user_id: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        username: Option<&str>,
    ) -> AppResult<UserRecord> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                username = COALESCE($4, username),
                updated_at = $5
            WHERE id = $1
            ",
        )
        .bind(user_id)
        .bind(first_name)
        .bind(last_name)
        .bind(username)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update user: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Replace the stored password hash
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_password_hash(&self, user_id: &str, password_hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .bind(now_timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update password: {e}")))?;
        Ok(())
    }

    /// Enable or disable an account
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist
    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE users SET is_active = $2, updated_at = $3 WHERE id = $1")
                .bind(user_id)
                .bind(is_active)
                .bind(now_timestamp())
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to update user status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }

    /// Change an account's role
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist
    pub async fn set_user_role(&self, user_id: &str, role: UserRole) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET role = $2, updated_at = $3 WHERE id = $1")
            .bind(user_id)
            .bind(role.as_str())
            .bind(now_timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update user role: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }

    /// All accounts, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_users(&self) -> AppResult<Vec<UserRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY date_joined DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list users: {e}")))?;

        rows.iter().map(row_to_user).collect()
    }

    /// Issue a fresh email verification token valid for 24 hours
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_verification_token(&self, user_id: &str) -> AppResult<String> {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(EMAIL_VERIFICATION_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        let now = Utc::now();
        let expires_at = now + Duration::hours(EMAIL_VERIFICATION_TTL_HOURS);

        sqlx::query(
            r"
            INSERT INTO email_verification_tokens (id, user_id, token, expires_at, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(&token)
        .bind(expires_at.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create verification token: {e}")))?;

        Ok(token)
    }

    /// Consume a verification token and mark its user verified
    ///
    /// Returns the verified user's ID.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the token is unknown, used or expired
    pub async fn verify_email_token(&self, token: &str) -> AppResult<String> {
        let mut guard = self.begin_write().await?;

        let row = sqlx::query(
            "SELECT user_id, is_used, expires_at FROM email_verification_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(guard.executor()?)
        .await?
        .ok_or_else(|| AppError::invalid_input("Invalid verification token."))?;

        let user_id: String = row.get("user_id");
        let is_used: bool = row.get("is_used");
        let expires_at: String = row.get("expires_at");
        let expired = DateTime::parse_from_rfc3339(&expires_at)
            .map_or(true, |expiry| expiry.with_timezone(&Utc) < Utc::now());

        if is_used || expired {
            return Err(AppError::invalid_input(
                "Verification token is expired or already used.",
            ));
        }

        sqlx::query("UPDATE email_verification_tokens SET is_used = 1 WHERE token = $1")
            .bind(token)
            .execute(guard.executor()?)
            .await?;
        sqlx::query("UPDATE users SET is_verified = 1, updated_at = $2 WHERE id = $1")
            .bind(&user_id)
            .bind(now_timestamp())
            .execute(guard.executor()?)
            .await?;

        guard.commit().await?;
        Ok(user_id)
    }

    /// Get a user's profile
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user has no profile
    pub async fn get_profile(&self, user_id: &str) -> AppResult<ProfileRecord> {
        let row = sqlx::query(
            r"
            SELECT user_id, bio, phone_number, location, created_at, updated_at
            FROM user_profiles WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        row.as_ref()
            .map(row_to_profile)
            .ok_or_else(|| AppError::not_found("Profile"))
    }

    /// All profiles, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_profiles(&self) -> AppResult<Vec<ProfileRecord>> {
        let rows = sqlx::query(
            r"
            SELECT user_id, bio, phone_number, location, created_at, updated_at
            FROM user_profiles ORDER BY created_at DESC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list profiles: {e}")))?;

        Ok(rows.iter().map(row_to_profile).collect())
    }

    /// Update profile fields; `None` leaves a field unchanged
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user has no profile
    pub async fn update_profile(
        &self,
        user_id: &str,
        bio: Option<&str>,
        phone_number: Option<&str>,
        location: Option<&str>,
    ) -> AppResult<ProfileRecord> {
        sqlx::query(
            r"
            UPDATE user_profiles
            SET bio = COALESCE($2, bio),
                phone_number = COALESCE($3, phone_number),
                location = COALESCE($4, location),
                updated_at = $5
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(bio)
        .bind(phone_number)
        .bind(location)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        self.get_profile(user_id).await
    }
}
