// ABOUTME: Account roles and chat session role labels
// ABOUTME: Explicit enumerations replacing string comparison of role names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a registered account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Student looking for mentorship and products
    #[default]
    Student,
    /// Startup selling products
    Startup,
    /// Mentor
    Mentor,
    /// Platform administrator
    Admin,
}

impl UserRole {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Startup => "STARTUP",
            Self::Mentor => "MENTOR",
            Self::Admin => "ADMIN",
        }
    }

    /// Whether a user may pick this role at registration
    #[must_use]
    pub const fn is_self_assignable(self) -> bool {
        match self {
            Self::Student | Self::Startup | Self::Mentor => true,
            Self::Admin => false,
        }
    }

    /// Administrator check
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STUDENT" => Ok(Self::Student),
            "STARTUP" => Ok(Self::Startup),
            "MENTOR" => Ok(Self::Mentor),
            "ADMIN" => Ok(Self::Admin),
            other => Err(AppError::invalid_input(format!("Unknown role: {other}"))),
        }
    }
}

/// Role label captured on a chat session when it is created
///
/// Anonymous sessions have no owning user. The label is denormalized: changing a
/// user's role later does not rewrite existing sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionRole {
    /// No authenticated user
    Anonymous,
    /// Authenticated student
    Student,
    /// Authenticated startup
    Startup,
    /// Authenticated mentor
    Mentor,
    /// Authenticated administrator
    Admin,
}

impl SessionRole {
    /// Label for a session opened by the given (optional) account role
    #[must_use]
    pub const fn for_user(role: Option<UserRole>) -> Self {
        match role {
            None => Self::Anonymous,
            Some(UserRole::Student) => Self::Student,
            Some(UserRole::Startup) => Self::Startup,
            Some(UserRole::Mentor) => Self::Mentor,
            Some(UserRole::Admin) => Self::Admin,
        }
    }

    /// Database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anonymous => "ANONYMOUS",
            Self::Student => "STUDENT",
            Self::Startup => "STARTUP",
            Self::Mentor => "MENTOR",
            Self::Admin => "ADMIN",
        }
    }

    /// Whether replies in this session get an encouragement suffix
    #[must_use]
    pub const fn receives_encouragement(self) -> bool {
        match self {
            Self::Student => true,
            Self::Anonymous | Self::Startup | Self::Mentor | Self::Admin => false,
        }
    }
}

impl FromStr for SessionRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANONYMOUS" => Ok(Self::Anonymous),
            other => UserRole::from_str(other).map(|role| Self::for_user(Some(role))),
        }
    }
}
