// ABOUTME: Storage for mentor FAQ entries, chat sessions, and chat messages
// ABOUTME: Sessions are created lazily per identifier and messages are append-only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::now_timestamp;
use crate::errors::{AppError, AppResult};
use crate::models::{FaqCategory, ResponseType, SessionRole};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

// ============================================================================
// Database Record Types
// ============================================================================

/// Mentor FAQ entry
#[derive(Debug, Clone, Serialize)]
pub struct FaqRecord {
    /// Unique FAQ ID
    pub id: String,
    /// Question text, unique across entries
    pub question: String,
    /// Answer returned verbatim on a match
    pub answer: String,
    /// Lowercased keywords in stored order
    pub keywords: Vec<String>,
    /// Topic
    pub category: FaqCategory,
    /// Higher priority entries are tried first and score higher
    pub priority: i64,
    /// Inactive entries never match and are hidden from listings
    pub is_active: bool,
    /// When the entry was created
    pub created_at: String,
    /// When the entry was last updated
    pub updated_at: String,
}

/// Fields for a new FAQ entry
#[derive(Debug, Clone, Copy)]
pub struct NewFaq<'a> {
    /// Question text
    pub question: &'a str,
    /// Answer text
    pub answer: &'a str,
    /// Comma-separated keywords
    pub keywords: &'a str,
    /// Topic
    pub category: FaqCategory,
    /// Priority
    pub priority: i64,
}

/// Conversation session keyed by a client-visible identifier
#[derive(Debug, Clone, Serialize)]
pub struct ChatSessionRecord {
    /// Internal row ID
    pub id: String,
    /// Client-visible session identifier
    pub session_id: String,
    /// Owning user, if the first message was authenticated
    pub user_id: Option<String>,
    /// Role captured when the session was created
    pub user_role: SessionRole,
    /// Active flag
    pub is_active: bool,
    /// When the session was created
    pub created_at: String,
}

/// One stored chat exchange
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageRecord {
    /// Unique message ID
    pub id: String,
    /// Internal ID of the owning session
    pub session_id: String,
    /// Raw user text
    pub user_message: String,
    /// Generated reply as stored
    pub bot_response: String,
    /// How the reply was produced
    pub response_type: ResponseType,
    /// FAQ entry that produced the reply
    pub matched_faq_id: Option<String>,
    /// When the message was stored
    pub created_at: String,
}

/// Chat history item as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ChatHistoryEntry {
    /// Raw user text
    pub user_message: String,
    /// Stored reply
    pub bot_response: String,
    /// How the reply was produced
    pub response_type: ResponseType,
    /// When the exchange was stored
    pub timestamp: String,
}

/// Number of active FAQs in a category
#[derive(Debug, Clone, Serialize)]
pub struct FaqCategoryCount {
    /// Category key
    pub key: FaqCategory,
    /// Human-readable name
    pub display_name: &'static str,
    /// Active entries in the category
    pub count: i64,
}

/// Split a stored keyword list into trimmed, lowercased, non-empty tokens
fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

fn row_to_faq(row: &SqliteRow) -> AppResult<FaqRecord> {
    let keywords: String = row.get("keywords");
    Ok(FaqRecord {
        id: row.get("id"),
        question: row.get("question"),
        answer: row.get("answer"),
        keywords: parse_keywords(&keywords),
        category: row.get::<String, _>("category").parse()?,
        priority: row.get("priority"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_session(row: &SqliteRow) -> AppResult<ChatSessionRecord> {
    Ok(ChatSessionRecord {
        id: row.get("id"),
        session_id: row.get("session_id"),
        user_id: row.get("user_id"),
        user_role: row.get::<String, _>("user_role").parse()?,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
    })
}

// ============================================================================
// Chat Manager
// ============================================================================

/// Chatbot database operations manager
pub struct ChatManager {
    pool: SqlitePool,
}

impl ChatManager {
    /// Create a new chat manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the FAQ, session, and message tables
    ///
    /// # Errors
    ///
    /// Returns an error if a `CREATE` statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS faq_entries (
                id TEXT PRIMARY KEY,
                question TEXT NOT NULL UNIQUE,
                answer TEXT NOT NULL,
                keywords TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL DEFAULT 'general',
                priority INTEGER NOT NULL DEFAULT 1,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chat_sessions (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL UNIQUE,
                user_id TEXT REFERENCES users(id) ON DELETE SET NULL,
                user_role TEXT NOT NULL DEFAULT 'ANONYMOUS',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS chat_messages (
                id TEXT PRIMARY KEY,
                session_id TEXT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
                user_message TEXT NOT NULL,
                bot_response TEXT NOT NULL,
                response_type TEXT NOT NULL,
                matched_faq_id TEXT REFERENCES faq_entries(id) ON DELETE SET NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_chat_messages_session ON chat_messages(session_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ========================================================================
    // FAQ Operations
    // ========================================================================

    /// Active FAQ entries, highest priority first, then by question
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn active_faqs(&self) -> AppResult<Vec<FaqRecord>> {
        self.list_faqs(None).await
    }

    /// Active FAQ entries, optionally restricted to a category
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_faqs(&self, category: Option<FaqCategory>) -> AppResult<Vec<FaqRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, question, answer, keywords, category, priority, is_active, created_at, updated_at
            FROM faq_entries
            WHERE is_active = 1 AND ($1 IS NULL OR category = $1)
            ORDER BY priority DESC, question ASC
            ",
        )
        .bind(category.map(FaqCategory::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list FAQs: {e}")))?;

        rows.iter().map(row_to_faq).collect()
    }

    /// Get an active FAQ entry by ID
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_faq(&self, faq_id: &str) -> AppResult<Option<FaqRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, question, answer, keywords, category, priority, is_active, created_at, updated_at
            FROM faq_entries
            WHERE id = $1 AND is_active = 1
            ",
        )
        .bind(faq_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get FAQ: {e}")))?;

        row.as_ref().map(row_to_faq).transpose()
    }

    /// Count active FAQs per category, ordered by category key
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn faq_category_counts(&self) -> AppResult<Vec<FaqCategoryCount>> {
        let rows = sqlx::query(
            r"
            SELECT category, COUNT(*) AS count
            FROM faq_entries
            WHERE is_active = 1
            GROUP BY category
            ORDER BY category
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count FAQ categories: {e}")))?;

        rows.iter()
            .map(|row| {
                let key: FaqCategory = row.get::<String, _>("category").parse()?;
                Ok(FaqCategoryCount {
                    key,
                    display_name: key.display_name(),
                    count: row.get("count"),
                })
            })
            .collect()
    }

    /// Insert an FAQ unless one with the same question exists
    ///
    /// Returns the stored entry and whether it was newly created.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_or_create_faq(&self, faq: &NewFaq<'_>) -> AppResult<(FaqRecord, bool)> {
        let now = now_timestamp();
        let result = sqlx::query(
            r"
            INSERT INTO faq_entries (id, question, answer, keywords, category, priority, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 1, $7, $7)
            ON CONFLICT(question) DO NOTHING
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(faq.question)
        .bind(faq.answer)
        .bind(faq.keywords)
        .bind(faq.category.as_str())
        .bind(faq.priority)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert FAQ: {e}")))?;

        let row = sqlx::query(
            r"
            SELECT id, question, answer, keywords, category, priority, is_active, created_at, updated_at
            FROM faq_entries
            WHERE question = $1
            ",
        )
        .bind(faq.question)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read FAQ: {e}")))?;

        Ok((row_to_faq(&row)?, result.rows_affected() == 1))
    }

    /// Delete every FAQ entry, returning how many were removed
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn clear_faqs(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM faq_entries")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear FAQs: {e}")))?;
        Ok(result.rows_affected())
    }

    // ========================================================================
    // Session Operations
    // ========================================================================

    /// Fetch a session by identifier, creating it if absent
    ///
    /// Owner and role are only recorded when the session is created.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_or_create_session(
        &self,
        session_id: &str,
        user_id: Option<&str>,
        role: SessionRole,
    ) -> AppResult<ChatSessionRecord> {
        sqlx::query(
            r"
            INSERT INTO chat_sessions (id, session_id, user_id, user_role, is_active, created_at)
            VALUES ($1, $2, $3, $4, 1, $5)
            ON CONFLICT(session_id) DO NOTHING
            ",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(session_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create chat session: {e}")))?;

        let row = sqlx::query(
            r"
            SELECT id, session_id, user_id, user_role, is_active, created_at
            FROM chat_sessions
            WHERE session_id = $1
            ",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read chat session: {e}")))?;

        row_to_session(&row)
    }

    // ========================================================================
    // Message Operations
    // ========================================================================

    /// Append one exchange to a session
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn record_message(
        &self,
        session: &ChatSessionRecord,
        user_message: &str,
        bot_response: &str,
        response_type: ResponseType,
        matched_faq_id: Option<&str>,
    ) -> AppResult<ChatMessageRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();

        sqlx::query(
            r"
            INSERT INTO chat_messages (id, session_id, user_message, bot_response, response_type, matched_faq_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&id)
        .bind(&session.id)
        .bind(user_message)
        .bind(bot_response)
        .bind(response_type.as_str())
        .bind(matched_faq_id)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store chat message: {e}")))?;

        Ok(ChatMessageRecord {
            id,
            session_id: session.id.clone(),
            user_message: user_message.to_owned(),
            bot_response: bot_response.to_owned(),
            response_type,
            matched_faq_id: matched_faq_id.map(ToOwned::to_owned),
            created_at: now,
        })
    }

    /// Messages of a session in creation order; empty for an unknown session
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn history(&self, session_id: &str) -> AppResult<Vec<ChatHistoryEntry>> {
        let rows = sqlx::query(
            r"
            SELECT m.user_message, m.bot_response, m.response_type, m.created_at
            FROM chat_messages m
            JOIN chat_sessions s ON s.id = m.session_id
            WHERE s.session_id = $1
            ORDER BY m.created_at ASC, m.rowid ASC
            ",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get chat history: {e}")))?;

        rows.iter()
            .map(|row| {
                Ok(ChatHistoryEntry {
                    user_message: row.get("user_message"),
                    bot_response: row.get("bot_response"),
                    response_type: row.get::<String, _>("response_type").parse()?,
                    timestamp: row.get("created_at"),
                })
            })
            .collect()
    }
}
