// ABOUTME: Mentor chatbot route handlers: chat turns, suggestions, history, and FAQ browsing
// ABOUTME: All endpoints are public; an optional bearer token attaches the session to a user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Mentor chatbot routes
//!
//! Chat turns accept an optional bearer token. Anonymous callers get an
//! anonymous session; a supplied token that does not validate is rejected.

use crate::database::{ChatHistoryEntry, FaqCategoryCount, FaqRecord};
use crate::errors::{AppError, AppResult};
use crate::middleware::optional_auth;
use crate::models::FaqCategory;
use crate::resources::ServerResources;
use crate::services::mentor::{get_chat_history, mentor_suggestions};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Chat turn request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User message
    #[serde(default)]
    pub message: String,
    /// Existing or client-chosen session identifier
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Stored conversation of one session
#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    /// Session identifier
    pub session_id: String,
    /// Turns in creation order
    pub messages: Vec<ChatHistoryEntry>,
}

/// FAQ category listing
#[derive(Debug, Serialize)]
pub struct FaqCategoriesResponse {
    /// Categories with active entries
    pub categories: Vec<FaqCategoryCount>,
}

/// FAQ listing query
#[derive(Debug, Deserialize, Default)]
pub struct FaqListQuery {
    /// Restrict to one category key
    #[serde(default)]
    pub category: Option<String>,
}

/// FAQ listing
#[derive(Debug, Serialize)]
pub struct FaqListResponse {
    /// Active entries, highest priority first
    pub faqs: Vec<FaqRecord>,
    /// Number of entries returned
    pub total: usize,
}

/// Mentor chatbot routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chatbot routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chatbot/chat", post(Self::chat))
            .route("/api/chatbot/suggestions", get(Self::suggestions))
            .route("/api/chatbot/history/:session_id", get(Self::history))
            .route("/api/chatbot/categories", get(Self::categories))
            .route("/api/chatbot/faqs", get(Self::list_faqs))
            .route("/api/chatbot/faqs/:faq_id", get(Self::get_faq))
            .with_state(resources)
    }

    /// Process one chat turn
    async fn chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ChatRequest>,
    ) -> Result<Response, AppError> {
        let identity = optional_auth(&headers, &resources).await?;
        let chat = resources.database.chat();

        let turn = resources
            .chatbot
            .process_chat_turn(
                &chat,
                &request.message,
                request.session_id.as_deref(),
                identity.as_ref(),
            )
            .await?;

        Ok(Json(turn).into_response())
    }

    async fn suggestions() -> Json<serde_json::Value> {
        Json(serde_json::json!(mentor_suggestions()))
    }

    /// Conversation history; unknown sessions have no messages
    async fn history(
        State(resources): State<Arc<ServerResources>>,
        Path(session_id): Path<String>,
    ) -> Result<Response, AppError> {
        let messages = get_chat_history(&resources.database.chat(), &session_id).await?;
        Ok(Json(ChatHistoryResponse {
            session_id,
            messages,
        })
        .into_response())
    }

    async fn categories(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let categories = resources.database.chat().faq_category_counts().await?;
        Ok(Json(FaqCategoriesResponse { categories }).into_response())
    }

    async fn list_faqs(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<FaqListQuery>,
    ) -> Result<Response, AppError> {
        let category = parse_category(query.category.as_deref())?;
        let faqs = resources.database.chat().list_faqs(category).await?;
        let total = faqs.len();
        Ok(Json(FaqListResponse { faqs, total }).into_response())
    }

    async fn get_faq(
        State(resources): State<Arc<ServerResources>>,
        Path(faq_id): Path<String>,
    ) -> Result<Response, AppError> {
        let faq = resources
            .database
            .chat()
            .get_faq(&faq_id)
            .await?
            .ok_or_else(|| AppError::not_found("FAQ entry"))?;
        Ok(Json(faq).into_response())
    }
}

fn parse_category(raw: Option<&str>) -> AppResult<Option<FaqCategory>> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse)
        .transpose()
}
