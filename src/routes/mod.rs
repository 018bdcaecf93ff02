// ABOUTME: Route module organization for the marketplace HTTP API
// ABOUTME: Composes per-domain routers and applies the CORS and request tracing layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! HTTP routes organized by domain
//!
//! Each domain module exposes an `XRoutes::routes(resources)` constructor and
//! thin handlers that delegate to the database or service layer.

/// Account, login, and profile routes
pub mod auth;
/// Mentor chatbot routes
pub mod chat;
/// Health check route
pub mod health;
/// Categories, startup profiles, products, and reviews
pub mod marketplace;
/// Order placement and lifecycle routes
pub mod orders;

pub use auth::AuthRoutes;
pub use chat::ChatRoutes;
pub use health::HealthRoutes;
pub use marketplace::MarketplaceRoutes;
pub use orders::OrderRoutes;

use crate::errors::{AppError, AppResult};
use crate::middleware::{make_request_span, setup_cors};
use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config);

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(MarketplaceRoutes::routes(Arc::clone(&resources)))
        .merge(OrderRoutes::routes(Arc::clone(&resources)))
        .merge(ChatRoutes::routes(resources))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(cors)
}

/// Reject an optional text field longer than `max` characters
pub(crate) fn check_length(field: &str, value: Option<&str>, max: usize) -> AppResult<()> {
    match value {
        Some(text) if text.chars().count() > max => Err(AppError::out_of_range(format!(
            "{field} cannot exceed {max} characters."
        ))
        .with_details(serde_json::json!({ "field": field, "max_length": max }))),
        _ => Ok(()),
    }
}

/// Trim a required text field and check it is non-blank and within `max` characters
pub(crate) fn require_text<'a>(field: &str, value: &'a str, max: usize) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::missing_field(field, format!("{field} is required.")));
    }
    check_length(field, Some(trimmed), max)?;
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_require_text_trims_and_bounds() {
        assert_eq!(require_text("name", "  Widget ", 10).unwrap(), "Widget");
        assert_eq!(
            require_text("name", "   ", 10).unwrap_err().code,
            ErrorCode::MissingRequiredField
        );
        assert_eq!(
            require_text("name", "abcdefghijk", 10).unwrap_err().code,
            ErrorCode::ValueOutOfRange
        );
    }

    #[test]
    fn test_check_length_counts_characters() {
        assert!(check_length("bio", Some("ééééé"), 5).is_ok());
        assert!(check_length("bio", Some("éééééé"), 5).is_err());
        assert!(check_length("bio", None, 0).is_ok());
    }
}
