// ABOUTME: HTTP middleware for authentication, CORS, and request tracing
// ABOUTME: Resolves bearer tokens to users and builds per-request tracing spans
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

/// Bearer token authentication helpers
pub mod auth;
/// CORS layer configuration
pub mod cors;
/// Request span construction for the HTTP trace layer
pub mod tracing;

pub use auth::{bearer_token, optional_auth, require_auth};
pub use cors::setup_cors;
pub use self::tracing::make_request_span;
