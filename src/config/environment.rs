// ABOUTME: Environment-based configuration for ports, database, JWT, and CORS settings
// ABOUTME: Generates a per-process JWT secret outside production when none is configured
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::auth::generate_jwt_secret;
use crate::constants::defaults::{
    ACCESS_TOKEN_LIFETIME_MINUTES, DEFAULT_DATABASE_URL, DEFAULT_HOST,
    REFRESH_TOKEN_LIFETIME_DAYS,
};
use crate::constants::ports::DEFAULT_HTTP_PORT;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Environment type for security and other configurations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Deployed service
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// JWT and password hashing settings
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: Vec<u8>,
    /// The secret was generated at startup and will not survive a restart
    pub jwt_secret_generated: bool,
    /// Access token lifetime in minutes
    pub access_token_lifetime_minutes: i64,
    /// Refresh token lifetime in days
    pub refresh_token_lifetime_days: i64,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_secret_generated", &self.jwt_secret_generated)
            .field(
                "access_token_lifetime_minutes",
                &self.access_token_lifetime_minutes,
            )
            .field("refresh_token_lifetime_days", &self.refresh_token_lifetime_days)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

/// Cross-origin settings
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// `*` or a comma-separated origin list
    pub allowed_origins: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Bind address
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// `SQLite` connection URL
    pub database_url: String,
    /// Authentication settings
    pub auth: AuthConfig,
    /// CORS settings
    pub cors: CorsConfig,
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_env<T>(key: &str, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::config(format!("Invalid {key} value '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a numeric variable does not parse or if
    /// `JWT_SECRET` is missing in production
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let environment = Environment::from_str_or_default(&env_var_or("ENVIRONMENT", ""));

        let (jwt_secret, jwt_secret_generated) = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => (secret.into_bytes(), false),
            _ if environment.is_production() => {
                return Err(AppError::config(
                    "JWT_SECRET must be set when ENVIRONMENT=production",
                ));
            }
            _ => {
                warn!(
                    "JWT_SECRET not set; generated a per-process secret, tokens will not survive a restart"
                );
                (generate_jwt_secret().to_vec(), true)
            }
        };

        let config = Self {
            environment,
            host: env_var_or("HOST", DEFAULT_HOST),
            http_port: parse_env("HTTP_PORT", DEFAULT_HTTP_PORT)?,
            database_url: env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            auth: AuthConfig {
                jwt_secret,
                jwt_secret_generated,
                access_token_lifetime_minutes: parse_env(
                    "JWT_ACCESS_TOKEN_LIFETIME_MINUTES",
                    ACCESS_TOKEN_LIFETIME_MINUTES,
                )?,
                refresh_token_lifetime_days: parse_env(
                    "JWT_REFRESH_TOKEN_LIFETIME_DAYS",
                    REFRESH_TOKEN_LIFETIME_DAYS,
                )?,
                bcrypt_cost: parse_env("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            },
            cors: CorsConfig {
                allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*"),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for non-positive token lifetimes or a bcrypt
    /// cost outside 4..=31
    pub fn validate(&self) -> AppResult<()> {
        if self.auth.access_token_lifetime_minutes <= 0 {
            return Err(AppError::config(
                "JWT_ACCESS_TOKEN_LIFETIME_MINUTES must be positive",
            ));
        }
        if self.auth.refresh_token_lifetime_days <= 0 {
            return Err(AppError::config(
                "JWT_REFRESH_TOKEN_LIFETIME_DAYS must be positive",
            ));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(AppError::config("BCRYPT_COST must be between 4 and 31"));
        }
        Ok(())
    }

    /// Filesystem path of a file-backed `SQLite` database, `None` for in-memory
    #[must_use]
    pub fn database_file_path(&self) -> Option<PathBuf> {
        if self.database_url.contains(":memory:") {
            return None;
        }
        let path = self
            .database_url
            .strip_prefix("sqlite://")
            .or_else(|| self.database_url.strip_prefix("sqlite:"))?;
        let path = path.split('?').next().unwrap_or(path);
        Some(PathBuf::from(path))
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Startup Marketplace Configuration:\n\
             - Environment: {}\n\
             - Bind: {}:{}\n\
             - Database: {}\n\
             - JWT Secret: {}\n\
             - Access Token Lifetime: {} minutes\n\
             - Refresh Token Lifetime: {} days\n\
             - CORS Origins: {}",
            self.environment,
            self.host,
            self.http_port,
            if self.database_url.contains(":memory:") {
                "SQLite (in-memory)"
            } else {
                "SQLite (file)"
            },
            if self.auth.jwt_secret_generated {
                "Generated"
            } else {
                "Configured"
            },
            self.auth.access_token_lifetime_minutes,
            self.auth.refresh_token_lifetime_days,
            self.cors.allowed_origins,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(database_url: &str) -> ServerConfig {
        ServerConfig {
            environment: Environment::Testing,
            host: "127.0.0.1".to_owned(),
            http_port: 8000,
            database_url: database_url.to_owned(),
            auth: AuthConfig {
                jwt_secret: b"secret".to_vec(),
                jwt_secret_generated: false,
                access_token_lifetime_minutes: 60,
                refresh_token_lifetime_days: 7,
                bcrypt_cost: 4,
            },
            cors: CorsConfig {
                allowed_origins: "*".to_owned(),
            },
        }
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("PROD"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("test"),
            Environment::Testing
        );
        assert_eq!(
            Environment::from_str_or_default("whatever"),
            Environment::Development
        );
    }

    #[test]
    fn test_database_file_path() {
        assert_eq!(
            config("sqlite:./data/marketplace.db").database_file_path(),
            Some(PathBuf::from("./data/marketplace.db"))
        );
        assert_eq!(
            config("sqlite:///tmp/m.db?mode=rwc").database_file_path(),
            Some(PathBuf::from("/tmp/m.db"))
        );
        assert_eq!(config("sqlite::memory:").database_file_path(), None);
    }

    #[test]
    fn test_validate_rejects_bad_lifetimes() {
        let mut cfg = config("sqlite::memory:");
        assert!(cfg.validate().is_ok());
        cfg.auth.access_token_lifetime_minutes = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_summary_hides_secret() {
        let cfg = config("sqlite::memory:");
        let summary = cfg.summary();
        assert!(summary.contains("in-memory"));
        assert!(!summary.contains("secret"));
        assert!(!format!("{cfg:?}").contains("115, 101, 99"));
    }
}
