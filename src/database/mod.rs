// ABOUTME: SQLite database manager with idempotent schema migrations
// ABOUTME: Owns the connection pool; per-domain operations live in sibling modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Database Management
//!
//! `Database` wraps a `SQLite` pool and runs `CREATE TABLE IF NOT EXISTS`
//! migrations on startup. Each domain adds its own `impl Database` block
//! (users, marketplace, orders) while the chatbot tables are handled by
//! [`ChatManager`].
//!
//! Identifiers are UUID v4 strings, timestamps are RFC 3339 UTC strings and money
//! is stored as integer cents.

mod chat;
mod marketplace;
mod orders;
/// FAQ seed data used by the `seed-mentor-faqs` binary
pub mod seed_faqs;
mod transactions;
mod users;

pub use chat::{
    ChatHistoryEntry, ChatManager, ChatMessageRecord, ChatSessionRecord, FaqCategoryCount,
    FaqRecord, NewFaq,
};
pub use marketplace::{
    CategoryRecord, NewProduct, ProductFilter, ProductRecord, ProductUpdate, ProductVisibility,
    ReviewRecord, StartupProfileRecord, StartupVisibility,
};
pub use orders::{OrderItemRecord, OrderLine, OrderRecord};
pub use transactions::{SqliteTransactionGuard, TransactionGuard};
pub use users::{ProfileRecord, UserRecord};

use crate::constants::defaults::SQLITE_BUSY_TIMEOUT_SECS;
use crate::errors::AppResult;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Current time as a fixed-width RFC 3339 string, so text ordering is time ordering
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Database manager for all marketplace storage
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run migrations
    ///
    /// In-memory databases are held on a single never-recycled connection; every
    /// pooled connection to `sqlite::memory:` would otherwise see its own empty
    /// database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails or a
    /// migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(SQLITE_BUSY_TIMEOUT_SECS));

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let db = Self { pool };
        db.migrate().await?;
        info!("Database ready: {database_url}");
        Ok(db)
    }

    /// Get a reference to the pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a write transaction holding the `SQLite` write lock from the start
    ///
    /// A deferred transaction that reads before writing cannot upgrade its lock
    /// while another writer is active and fails with `SQLITE_BUSY` instead of
    /// waiting. `BEGIN IMMEDIATE` queues on the busy timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available or the lock is not
    /// granted within the busy timeout
    pub async fn begin_write(&self) -> AppResult<SqliteTransactionGuard<'static>> {
        let transaction = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(SqliteTransactionGuard::new(transaction))
    }

    /// Chat manager sharing this pool
    #[must_use]
    pub fn chat(&self) -> ChatManager {
        ChatManager::new(self.pool.clone())
    }

    /// Run all schema migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any `CREATE` statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_marketplace().await?;
        self.migrate_orders().await?;
        self.chat().migrate().await?;
        debug!("Database migrations complete");
        Ok(())
    }
}
