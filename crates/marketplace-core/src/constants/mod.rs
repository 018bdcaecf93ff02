// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for limits, scoring weights, defaults, and service names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Constants grouped by domain rather than kept in a single flat list.

/// Service identification
pub mod service_names {
    /// Service name used in logs and startup banners
    pub const MARKETPLACE_SERVER: &str = "startup-marketplace";
    /// JWT audience claim
    pub const JWT_AUDIENCE: &str = "startup-marketplace-api";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8000;
}

/// Environment-derived defaults
pub mod defaults {
    /// Default bind address
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    /// Default `SQLite` database location
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/marketplace.db";
    /// Access token lifetime in minutes
    pub const ACCESS_TOKEN_LIFETIME_MINUTES: i64 = 60;
    /// Refresh token lifetime in days
    pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 7;
    /// How long a `SQLite` connection waits for the write lock before failing
    pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 10;
}

/// Input limits
pub mod limits {
    /// Maximum chat message length in characters
    pub const MAX_CHAT_MESSAGE_LENGTH: usize = 1000;
    /// Maximum client-supplied chat session identifier length
    pub const MAX_SESSION_ID_LENGTH: usize = 100;
    /// Default page size for list endpoints
    pub const DEFAULT_PAGE_SIZE: i64 = 20;
    /// Upper bound for client-requested page size
    pub const MAX_PAGE_SIZE: i64 = 100;
    /// Minimum password length
    pub const MIN_PASSWORD_LENGTH: usize = 8;
    /// Maximum product name length
    pub const MAX_PRODUCT_NAME_LENGTH: usize = 200;
    /// Maximum company name length
    pub const MAX_COMPANY_NAME_LENGTH: usize = 200;
    /// Maximum category name length
    pub const MAX_CATEGORY_NAME_LENGTH: usize = 100;
    /// Maximum review title length
    pub const MAX_REVIEW_TITLE_LENGTH: usize = 200;
    /// Maximum profile bio length
    pub const MAX_BIO_LENGTH: usize = 500;
    /// Maximum profile phone number length
    pub const MAX_PHONE_NUMBER_LENGTH: usize = 20;
    /// Maximum profile location length
    pub const MAX_LOCATION_LENGTH: usize = 100;
    /// Maximum startup description length
    pub const MAX_STARTUP_DESCRIPTION_LENGTH: usize = 1000;
    /// Maximum category description length
    pub const MAX_CATEGORY_DESCRIPTION_LENGTH: usize = 500;
    /// Number of recent reviews embedded in a product detail response
    pub const RECENT_REVIEWS_IN_DETAIL: i64 = 5;
    /// Lowest accepted review rating
    pub const MIN_RATING: i64 = 1;
    /// Highest accepted review rating
    pub const MAX_RATING: i64 = 5;
}

/// FAQ matching weights
pub mod matching {
    /// Score contributed by each keyword found in the message
    pub const KEYWORD_WEIGHT: f64 = 3.0;
    /// Score contributed per unit of FAQ priority
    pub const PRIORITY_WEIGHT: f64 = 0.5;
    /// A match must score strictly above this to be accepted
    pub const MATCH_THRESHOLD: f64 = 2.0;
}

/// Order numbering
pub mod orders {
    /// Literal prefix of every order number
    pub const ORDER_NUMBER_PREFIX: &str = "ORD-";
    /// Number of upper-case hex characters after the prefix
    pub const ORDER_NUMBER_HEX_LENGTH: usize = 12;
}

/// Account lifecycle
pub mod accounts {
    /// Email verification token validity in hours
    pub const EMAIL_VERIFICATION_TTL_HOURS: i64 = 24;
    /// Email verification token length
    pub const EMAIL_VERIFICATION_TOKEN_LENGTH: usize = 64;
    /// Characters accepted as the "special" password character class
    pub const PASSWORD_SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";
}
