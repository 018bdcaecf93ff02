// ABOUTME: Main library entry point for the startup marketplace server
// ABOUTME: Exposes the catalog, order, account, and mentor chatbot HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Startup Marketplace
//!
//! A marketplace where student-run startups list products, buyers place
//! orders, and an FAQ mentor chatbot answers common founder questions.
//!
//! ## Features
//!
//! - **Catalog**: categories, startup profiles, products, and reviews
//! - **Orders**: atomic placement and cancellation with inventory tracking
//! - **Mentor chatbot**: keyword-scored FAQ matching with per-session history
//! - **Accounts**: registration, JWT login, email verification, and profiles
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use startup_marketplace::config::ServerConfig;
//! use startup_marketplace::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Marketplace configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// JWT issuing and validation, password hashing, and credential checks
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// `SQLite` storage for accounts, catalog, orders, and chat
pub mod database;

/// Structured logging setup
pub mod logging;

/// Authentication, CORS, and request tracing helpers
pub mod middleware;

/// Shared state handed to route handlers
pub mod resources;

/// HTTP routes organized by domain
pub mod routes;

/// Order workflows and the mentor chatbot
pub mod services;

pub use marketplace_core::{constants, errors, models};
