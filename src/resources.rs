// ABOUTME: Shared server resources handed to every axum router as state
// ABOUTME: Bundles the database, auth manager, configuration, and mentor chatbot
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::services::mentor::MentorChatbot;
use std::sync::Arc;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Database manager
    pub database: Arc<Database>,
    /// JWT and password manager
    pub auth_manager: Arc<AuthManager>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Mentor chatbot with its RNG
    pub chatbot: Arc<MentorChatbot>,
}

impl ServerResources {
    /// Build resources from configuration, deriving the auth manager from it
    #[must_use]
    pub fn new(database: Database, config: ServerConfig, chatbot: MentorChatbot) -> Self {
        let auth_manager = AuthManager::new(
            &config.auth.jwt_secret,
            config.auth.access_token_lifetime_minutes,
            config.auth.refresh_token_lifetime_days,
            config.auth.bcrypt_cost,
        );
        Self {
            database: Arc::new(database),
            auth_manager: Arc::new(auth_manager),
            config: Arc::new(config),
            chatbot: Arc::new(chatbot),
        }
    }
}
