// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory server resources, test users, tokens, and catalog fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `startup_marketplace`

use anyhow::Result;
use rust_decimal::Decimal;
use startup_marketplace::{
    config::{AuthConfig, CorsConfig, Environment, ServerConfig},
    database::{Database, NewFaq, NewProduct, ProductRecord, StartupProfileRecord, UserRecord},
    models::{decimal_to_cents, FaqCategory, ProductStatus, ShippingAddress, UserRole},
    resources::ServerResources,
    services::mentor::MentorChatbot,
};
use std::str::FromStr;
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT_LOGGER: Once = Once::new();

/// Password satisfying every complexity rule
pub const TEST_PASSWORD: &str = "Str0ng!Pass";

/// Seed used for the deterministic chatbot
pub const TEST_CHATBOT_SEED: u64 = 42;

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Configuration for an in-memory database with the cheapest bcrypt cost
pub fn test_config() -> ServerConfig {
    ServerConfig {
        environment: Environment::Testing,
        host: "127.0.0.1".to_owned(),
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        auth: AuthConfig {
            jwt_secret: b"test-secret-key-for-integration-tests".to_vec(),
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

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new("sqlite::memory:").await?)
}

/// Server resources over a fresh in-memory database and a seeded chatbot
pub async fn create_test_server_resources() -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    Ok(Arc::new(ServerResources::new(
        database,
        test_config(),
        MentorChatbot::seeded(TEST_CHATBOT_SEED),
    )))
}

/// Server resources over a file-backed database at `database_url`
pub async fn create_file_server_resources(database_url: &str) -> Result<Arc<ServerResources>> {
    init_test_logging();
    let database = Database::new(database_url).await?;
    let mut config = test_config();
    config.database_url = database_url.to_owned();
    Ok(Arc::new(ServerResources::new(
        database,
        config,
        MentorChatbot::seeded(TEST_CHATBOT_SEED),
    )))
}

/// Create a user with [`TEST_PASSWORD`] and a unique email
pub async fn create_test_user(resources: &ServerResources, role: UserRole) -> Result<UserRecord> {
    let suffix = Uuid::new_v4().simple().to_string();
    let email = format!("{}-{}@example.com", role.as_str().to_lowercase(), &suffix[..8]);
    let password_hash = resources.auth_manager.hash_password(TEST_PASSWORD).await?;
    Ok(resources
        .database
        .create_user(&email, &suffix[..8], "Test", "User", role, &password_hash)
        .await?)
}

/// `Authorization` header value for a user
pub fn bearer(resources: &ServerResources, user: &UserRecord) -> Result<String> {
    let token = resources.auth_manager.generate_access_token(user)?;
    Ok(format!("Bearer {token}"))
}

/// A startup user with a verified profile
pub async fn create_test_startup(
    resources: &ServerResources,
) -> Result<(UserRecord, StartupProfileRecord)> {
    let user = create_test_user(resources, UserRole::Startup).await?;
    let profile = resources
        .database
        .create_startup_profile(&user.id, "Acme Labs", "", "", "Campus hardware", None)
        .await?;
    let profile = resources
        .database
        .set_startup_verified(&profile.id, true)
        .await?;
    Ok((user, profile))
}

/// An active product with the given price and stock
pub async fn create_test_product(
    resources: &ServerResources,
    startup: &StartupProfileRecord,
    name: &str,
    price: &str,
    inventory_count: i64,
) -> Result<ProductRecord> {
    let product = NewProduct {
        category_id: None,
        name: name.to_owned(),
        description: format!("{name} description"),
        price_cents: decimal_to_cents(Decimal::from_str(price)?)?,
        inventory_count,
        image_urls: Vec::new(),
        status: ProductStatus::Active,
        featured: false,
    };
    Ok(resources.database.create_product(&startup.id, &product).await?)
}

/// A complete shipping address
pub fn test_address() -> ShippingAddress {
    ShippingAddress {
        street: "1 Main St".to_owned(),
        city: "Springfield".to_owned(),
        state: "IL".to_owned(),
        postal_code: "62701".to_owned(),
        country: "US".to_owned(),
    }
}

/// Insert a small FAQ set covering funding and team building
pub async fn seed_test_faqs(database: &Database) -> Result<()> {
    let chat = database.chat();
    for faq in [
        NewFaq {
            question: "How do I raise seed funding?",
            answer: "Start with angels and accelerators.",
            keywords: "funding, seed, investor, raise",
            category: FaqCategory::Funding,
            priority: 2,
        },
        NewFaq {
            question: "How do I find a co-founder?",
            answer: "Look for complementary skills.",
            keywords: "cofounder, partner, team",
            category: FaqCategory::TeamBuilding,
            priority: 1,
        },
    ] {
        chat.get_or_create_faq(&faq).await?;
    }
    Ok(())
}
