// ABOUTME: Marketplace route handlers for categories, startup profiles, products, and reviews
// ABOUTME: Applies role-based visibility and ownership checks before touching storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Marketplace catalog routes
//!
//! Visibility follows the caller's role: administrators see everything,
//! startups see their own listings plus active ones, everyone else sees active
//! products and verified startup profiles only.

use super::{check_length, require_text};
use crate::auth::AuthenticatedUser;
use crate::constants::limits::{
    DEFAULT_PAGE_SIZE, MAX_CATEGORY_DESCRIPTION_LENGTH, MAX_CATEGORY_NAME_LENGTH,
    MAX_COMPANY_NAME_LENGTH, MAX_PAGE_SIZE, MAX_PRODUCT_NAME_LENGTH, MAX_RATING,
    MAX_REVIEW_TITLE_LENGTH, MAX_STARTUP_DESCRIPTION_LENGTH, MIN_RATING,
    RECENT_REVIEWS_IN_DETAIL,
};
use crate::database::{
    NewProduct, ProductFilter, ProductRecord, ProductUpdate, ProductVisibility, ReviewRecord,
    StartupProfileRecord, StartupVisibility,
};
use crate::errors::{AppError, AppResult};
use crate::middleware::{optional_auth, require_auth};
use crate::models::{decimal_to_cents, ProductStatus, UserRole};
use crate::resources::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Category creation request
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Unique name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
}

/// Category update request; absent fields are unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// Reactivate or deactivate
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Startup profile creation request
#[derive(Debug, Deserialize)]
pub struct CreateStartupProfileRequest {
    /// Company name
    pub company_name: String,
    /// Website
    #[serde(default)]
    pub website: String,
    /// Logo location
    #[serde(default)]
    pub logo_url: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Founding date as `YYYY-MM-DD`
    #[serde(default)]
    pub founded_date: Option<String>,
}

/// Startup profile update request; absent fields are unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateStartupProfileRequest {
    /// New company name
    #[serde(default)]
    pub company_name: Option<String>,
    /// New website
    #[serde(default)]
    pub website: Option<String>,
    /// New logo location
    #[serde(default)]
    pub logo_url: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New founding date as `YYYY-MM-DD`
    #[serde(default)]
    pub founded_date: Option<String>,
}

/// Product creation request
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    /// Category, if any
    #[serde(default)]
    pub category_id: Option<String>,
    /// Product name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Unit price
    pub price: Decimal,
    /// Initial stock
    #[serde(default)]
    pub inventory_count: i64,
    /// Image locations
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Initial status, `DRAFT` when absent
    #[serde(default)]
    pub status: Option<String>,
    /// Featured flag
    #[serde(default)]
    pub featured: bool,
}

/// Product update request; absent fields are unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    /// New category
    #[serde(default)]
    pub category_id: Option<String>,
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub description: Option<String>,
    /// New unit price
    #[serde(default)]
    pub price: Option<Decimal>,
    /// New stock level
    #[serde(default)]
    pub inventory_count: Option<i64>,
    /// New image list
    #[serde(default)]
    pub image_urls: Option<Vec<String>>,
    /// New status
    #[serde(default)]
    pub status: Option<String>,
    /// New featured flag
    #[serde(default)]
    pub featured: Option<bool>,
}

/// Product listing query
#[derive(Debug, Deserialize, Default)]
pub struct ProductListQuery {
    /// Category ID
    pub category: Option<String>,
    /// Status
    pub status: Option<String>,
    /// Featured flag
    pub featured: Option<bool>,
    /// Lowest price, inclusive
    pub min_price: Option<Decimal>,
    /// Highest price, inclusive
    pub max_price: Option<Decimal>,
    /// Only products with stock
    pub in_stock: Option<bool>,
    /// Text search over name, description, and company
    pub search: Option<String>,
    /// Page size
    pub limit: Option<i64>,
    /// Rows to skip
    pub offset: Option<i64>,
}

/// Product listing response
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    /// Matching products
    pub products: Vec<ProductRecord>,
    /// Number of products returned
    pub total: usize,
    /// Page size used
    pub limit: i64,
    /// Rows skipped
    pub offset: i64,
}

/// Product detail with its latest reviews
#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    /// Product
    #[serde(flatten)]
    pub product: ProductRecord,
    /// Most recent reviews
    pub recent_reviews: Vec<ReviewRecord>,
}

/// Review creation request
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    /// Rating from 1 to 5
    pub rating: i64,
    /// Headline
    #[serde(default)]
    pub title: String,
    /// Body
    #[serde(default)]
    pub comment: String,
}

// ============================================================================
// Validation Helpers
// ============================================================================

fn parse_founded_date(raw: Option<&str>) -> AppResult<Option<String>> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(|date| date.format("%Y-%m-%d").to_string())
                .map_err(|_| AppError::invalid_format("founded_date must be YYYY-MM-DD."))
        })
        .transpose()
}

fn positive_price_cents(price: Decimal) -> AppResult<i64> {
    if price <= Decimal::ZERO {
        return Err(AppError::out_of_range("Price must be greater than zero."));
    }
    decimal_to_cents(price)
}

fn check_inventory(inventory_count: i64) -> AppResult<()> {
    if inventory_count < 0 {
        return Err(AppError::out_of_range(
            "Inventory count cannot be negative.",
        ));
    }
    Ok(())
}

fn parse_status(raw: Option<&str>) -> AppResult<Option<ProductStatus>> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::parse)
        .transpose()
}

fn product_visibility(viewer: Option<&AuthenticatedUser>) -> ProductVisibility {
    match viewer.map(|user| (user.role, user.user_id.clone())) {
        Some((UserRole::Admin, _)) => ProductVisibility::All,
        Some((UserRole::Startup, user_id)) => ProductVisibility::ActiveOrOwnedBy(user_id),
        Some((UserRole::Student | UserRole::Mentor, _)) | None => ProductVisibility::ActiveOnly,
    }
}

fn can_view_product(viewer: Option<&AuthenticatedUser>, product: &ProductRecord) -> bool {
    product.status == ProductStatus::Active
        || viewer.is_some_and(|user| user.is_admin() || user.user_id == product.owner_id)
}

fn startup_visibility(viewer: &AuthenticatedUser) -> StartupVisibility {
    match viewer.role {
        UserRole::Admin => StartupVisibility::All,
        UserRole::Startup => StartupVisibility::OwnedBy(viewer.user_id.clone()),
        UserRole::Student | UserRole::Mentor => StartupVisibility::VerifiedOnly,
    }
}

fn can_view_startup(viewer: &AuthenticatedUser, profile: &StartupProfileRecord) -> bool {
    match startup_visibility(viewer) {
        StartupVisibility::All => true,
        StartupVisibility::OwnedBy(user_id) => profile.user_id == user_id,
        StartupVisibility::VerifiedOnly => profile.verified,
    }
}

fn page_bounds(limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
    (
        limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        offset.unwrap_or(0).max(0),
    )
}

// ============================================================================
// Routes
// ============================================================================

/// Marketplace catalog routes handler
pub struct MarketplaceRoutes;

impl MarketplaceRoutes {
    /// Create all catalog routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/marketplace/categories",
                get(Self::list_categories).post(Self::create_category),
            )
            .route(
                "/api/marketplace/categories/:category_id",
                put(Self::update_category).delete(Self::deactivate_category),
            )
            .route(
                "/api/marketplace/startup-profiles",
                get(Self::list_startup_profiles).post(Self::create_startup_profile),
            )
            .route(
                "/api/marketplace/startup-profiles/:profile_id",
                get(Self::get_startup_profile).put(Self::update_startup_profile),
            )
            .route(
                "/api/marketplace/startup-profiles/:profile_id/verify",
                post(Self::verify_startup_profile),
            )
            .route(
                "/api/marketplace/products",
                get(Self::list_products).post(Self::create_product),
            )
            .route(
                "/api/marketplace/products/:product_id",
                get(Self::get_product)
                    .put(Self::update_product)
                    .delete(Self::delete_product),
            )
            .route(
                "/api/marketplace/products/:product_id/reviews",
                get(Self::list_product_reviews).post(Self::add_review),
            )
            .route("/api/marketplace/reviews", get(Self::list_my_reviews))
            .with_state(resources)
    }

    // ------------------------------------------------------------------------
    // Categories
    // ------------------------------------------------------------------------

    async fn list_categories(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let categories = resources.database.list_categories(false).await?;
        Ok(Json(categories).into_response())
    }

    async fn create_category(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateCategoryRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        auth.require_admin()?;

        let name = require_text("name", &request.name, MAX_CATEGORY_NAME_LENGTH)?;
        check_length(
            "description",
            Some(&request.description),
            MAX_CATEGORY_DESCRIPTION_LENGTH,
        )?;

        let category = resources
            .database
            .create_category(name, &request.description)
            .await?;
        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok((StatusCode::CREATED, Json(category)).into_response())
    }

    async fn update_category(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(category_id): Path<String>,
        Json(request): Json<UpdateCategoryRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        auth.require_admin()?;

        let name = request
            .name
            .as_deref()
            .map(|name| require_text("name", name, MAX_CATEGORY_NAME_LENGTH))
            .transpose()?;
        check_length(
            "description",
            request.description.as_deref(),
            MAX_CATEGORY_DESCRIPTION_LENGTH,
        )?;

        let category = resources
            .database
            .update_category(
                &category_id,
                name,
                request.description.as_deref(),
                request.is_active,
            )
            .await?;
        Ok(Json(category).into_response())
    }

    /// Categories are deactivated rather than deleted so products keep them
    async fn deactivate_category(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(category_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        auth.require_admin()?;

        resources
            .database
            .update_category(&category_id, None, None, Some(false))
            .await?;
        info!(category_id = %category_id, "Category deactivated");
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    // ------------------------------------------------------------------------
    // Startup Profiles
    // ------------------------------------------------------------------------

    async fn list_startup_profiles(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let profiles = resources
            .database
            .list_startup_profiles(&startup_visibility(&auth))
            .await?;
        Ok(Json(profiles).into_response())
    }

    async fn create_startup_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateStartupProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        if auth.role != UserRole::Startup {
            return Err(AppError::permission_denied(
                "Only startup users can create startup profiles.",
            ));
        }

        let company_name =
            require_text("company_name", &request.company_name, MAX_COMPANY_NAME_LENGTH)?;
        check_length(
            "description",
            Some(&request.description),
            MAX_STARTUP_DESCRIPTION_LENGTH,
        )?;
        let founded_date = parse_founded_date(request.founded_date.as_deref())?;

        let profile = resources
            .database
            .create_startup_profile(
                &auth.user_id,
                company_name,
                request.website.trim(),
                request.logo_url.trim(),
                &request.description,
                founded_date.as_deref(),
            )
            .await?;
        info!(profile_id = %profile.id, user_id = %auth.user_id, "Startup profile created");
        Ok((StatusCode::CREATED, Json(profile)).into_response())
    }

    async fn get_startup_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(profile_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let profile = resources
            .database
            .get_startup_profile(&profile_id)
            .await?
            .filter(|profile| can_view_startup(&auth, profile))
            .ok_or_else(|| AppError::not_found("Startup profile"))?;
        Ok(Json(profile).into_response())
    }

    async fn update_startup_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(profile_id): Path<String>,
        Json(request): Json<UpdateStartupProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let profile = resources
            .database
            .get_startup_profile(&profile_id)
            .await?
            .filter(|profile| can_view_startup(&auth, profile))
            .ok_or_else(|| AppError::not_found("Startup profile"))?;
        if !auth.is_admin() && profile.user_id != auth.user_id {
            return Err(AppError::permission_denied(
                "You can only update your own startup profile.",
            ));
        }

        let company_name = request
            .company_name
            .as_deref()
            .map(|name| require_text("company_name", name, MAX_COMPANY_NAME_LENGTH))
            .transpose()?;
        check_length(
            "description",
            request.description.as_deref(),
            MAX_STARTUP_DESCRIPTION_LENGTH,
        )?;
        let founded_date = parse_founded_date(request.founded_date.as_deref())?;

        let updated = resources
            .database
            .update_startup_profile(
                &profile.id,
                company_name,
                request.website.as_deref().map(str::trim),
                request.logo_url.as_deref().map(str::trim),
                request.description.as_deref(),
                founded_date.as_deref(),
            )
            .await?;
        Ok(Json(updated).into_response())
    }

    async fn verify_startup_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(profile_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        if let Err(err) = auth.require_admin() {
            warn!(
                user_id = %auth.user_id,
                profile_id = %profile_id,
                "Rejected startup verification"
            );
            return Err(err);
        }

        let profile = resources
            .database
            .set_startup_verified(&profile_id, true)
            .await?;
        info!(
            profile_id = %profile.id,
            company = %profile.company_name,
            "Startup profile verified"
        );
        Ok(Json(profile).into_response())
    }

    // ------------------------------------------------------------------------
    // Products
    // ------------------------------------------------------------------------

    async fn list_products(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ProductListQuery>,
    ) -> Result<Response, AppError> {
        let viewer = optional_auth(&headers, &resources).await?;
        let (limit, offset) = page_bounds(query.limit, query.offset);

        let mut filter = ProductFilter::new(product_visibility(viewer.as_ref()), limit);
        filter.offset = offset;
        filter.category_id = query.category.filter(|value| !value.trim().is_empty());
        filter.status = parse_status(query.status.as_deref())?;
        filter.featured = query.featured;
        filter.min_price_cents = query.min_price.map(decimal_to_cents).transpose()?;
        filter.max_price_cents = query.max_price.map(decimal_to_cents).transpose()?;
        filter.in_stock = query.in_stock;
        filter.search = query
            .search
            .map(|search| search.trim().to_owned())
            .filter(|search| !search.is_empty());

        let products = resources.database.list_products(&filter).await?;
        let total = products.len();
        Ok(Json(ProductListResponse {
            products,
            total,
            limit,
            offset,
        })
        .into_response())
    }

    async fn create_product(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateProductRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        if auth.role != UserRole::Startup {
            return Err(AppError::permission_denied(
                "Only startup users can create products.",
            ));
        }
        let startup = resources
            .database
            .get_startup_profile_by_user(&auth.user_id)
            .await?
            .ok_or_else(|| {
                AppError::invalid_input("User must have a startup profile to create products.")
            })?;

        let name = require_text("name", &request.name, MAX_PRODUCT_NAME_LENGTH)?;
        let price_cents = positive_price_cents(request.price)?;
        check_inventory(request.inventory_count)?;
        let category_id = Self::active_category(&resources, request.category_id.as_deref()).await?;

        let product = resources
            .database
            .create_product(
                &startup.id,
                &NewProduct {
                    category_id,
                    name: name.to_owned(),
                    description: request.description,
                    price_cents,
                    inventory_count: request.inventory_count,
                    image_urls: request.image_urls,
                    status: parse_status(request.status.as_deref())?.unwrap_or_default(),
                    featured: request.featured,
                },
            )
            .await?;
        info!(
            product_id = %product.id,
            startup_id = %startup.id,
            name = %product.name,
            "Product created"
        );
        Ok((StatusCode::CREATED, Json(product)).into_response())
    }

    async fn get_product(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(product_id): Path<String>,
    ) -> Result<Response, AppError> {
        let viewer = optional_auth(&headers, &resources).await?;
        let product = Self::visible_product(&resources, viewer.as_ref(), &product_id).await?;
        let recent_reviews = resources
            .database
            .list_product_reviews(&product.id, Some(RECENT_REVIEWS_IN_DETAIL))
            .await?;
        Ok(Json(ProductDetailResponse {
            product,
            recent_reviews,
        })
        .into_response())
    }

    async fn update_product(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(product_id): Path<String>,
        Json(request): Json<UpdateProductRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let product = Self::owned_product(&resources, &auth, &product_id).await?;

        let name = request
            .name
            .as_deref()
            .map(|name| require_text("name", name, MAX_PRODUCT_NAME_LENGTH).map(ToOwned::to_owned))
            .transpose()?;
        let price_cents = request.price.map(positive_price_cents).transpose()?;
        if let Some(inventory_count) = request.inventory_count {
            check_inventory(inventory_count)?;
        }
        let category_id = Self::active_category(&resources, request.category_id.as_deref()).await?;

        let update = ProductUpdate {
            category_id,
            name,
            description: request.description,
            price_cents,
            inventory_count: request.inventory_count,
            image_urls: request.image_urls,
            status: parse_status(request.status.as_deref())?,
            featured: request.featured,
        };
        let updated = resources.database.update_product(&product.id, &update).await?;
        info!(product_id = %updated.id, user_id = %auth.user_id, "Product updated");
        Ok(Json(updated).into_response())
    }

    async fn delete_product(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(product_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let product = Self::owned_product(&resources, &auth, &product_id).await?;

        resources.database.delete_product(&product.id).await?;
        info!(product_id = %product.id, user_id = %auth.user_id, "Product deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    // ------------------------------------------------------------------------
    // Reviews
    // ------------------------------------------------------------------------

    async fn list_product_reviews(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(product_id): Path<String>,
    ) -> Result<Response, AppError> {
        let viewer = optional_auth(&headers, &resources).await?;
        let product = Self::visible_product(&resources, viewer.as_ref(), &product_id).await?;
        let reviews = resources
            .database
            .list_product_reviews(&product.id, None)
            .await?;
        Ok(Json(reviews).into_response())
    }

    async fn add_review(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(product_id): Path<String>,
        Json(request): Json<CreateReviewRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let product = Self::visible_product(&resources, Some(&auth), &product_id).await?;

        if !(MIN_RATING..=MAX_RATING).contains(&request.rating) {
            return Err(AppError::out_of_range(format!(
                "Rating must be between {MIN_RATING} and {MAX_RATING}."
            )));
        }
        check_length("title", Some(&request.title), MAX_REVIEW_TITLE_LENGTH)?;

        let verified_purchase = resources
            .database
            .has_delivered_purchase(&auth.user_id, &product.id)
            .await?;
        let review = resources
            .database
            .create_review(
                &product.id,
                &auth.user_id,
                request.rating,
                request.title.trim(),
                &request.comment,
                verified_purchase,
            )
            .await?;
        info!(
            product_id = %product.id,
            user_id = %auth.user_id,
            rating = review.rating,
            "Review added"
        );
        Ok((StatusCode::CREATED, Json(review)).into_response())
    }

    async fn list_my_reviews(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let owner = (!auth.is_admin()).then_some(auth.user_id.as_str());
        let reviews = resources.database.list_reviews_by_user(owner).await?;
        Ok(Json(reviews).into_response())
    }

    // ------------------------------------------------------------------------
    // Shared lookups
    // ------------------------------------------------------------------------

    async fn visible_product(
        resources: &ServerResources,
        viewer: Option<&AuthenticatedUser>,
        product_id: &str,
    ) -> AppResult<ProductRecord> {
        resources
            .database
            .get_product(product_id)
            .await?
            .filter(|product| can_view_product(viewer, product))
            .ok_or_else(|| AppError::not_found("Product"))
    }

    async fn owned_product(
        resources: &ServerResources,
        actor: &AuthenticatedUser,
        product_id: &str,
    ) -> AppResult<ProductRecord> {
        let product = Self::visible_product(resources, Some(actor), product_id).await?;
        if !actor.is_admin() && product.owner_id != actor.user_id {
            warn!(
                user_id = %actor.user_id,
                product_id = %product.id,
                "Rejected change to another startup's product"
            );
            return Err(AppError::permission_denied(
                "You can only modify your own products.",
            ));
        }
        Ok(product)
    }

    async fn active_category(
        resources: &ServerResources,
        category_id: Option<&str>,
    ) -> AppResult<Option<String>> {
        let Some(category_id) = category_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        resources
            .database
            .get_category(category_id)
            .await?
            .filter(|category| category.is_active)
            .map(|category| Some(category.id))
            .ok_or_else(|| AppError::invalid_input("Invalid category selected."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: "u-1".to_owned(),
            email: "u@example.com".to_owned(),
            role,
        }
    }

    #[test]
    fn test_founded_date_format() {
        assert_eq!(
            parse_founded_date(Some("2021-03-04")).unwrap().as_deref(),
            Some("2021-03-04")
        );
        assert!(parse_founded_date(Some("04/03/2021")).is_err());
        assert!(parse_founded_date(Some("")).unwrap().is_none());
        assert!(parse_founded_date(None).unwrap().is_none());
    }

    #[test]
    fn test_price_must_be_positive() {
        assert!(positive_price_cents(Decimal::ZERO).is_err());
        assert!(positive_price_cents(Decimal::from_str("-1").unwrap()).is_err());
        assert_eq!(
            positive_price_cents(Decimal::from_str("12.50").unwrap()).unwrap(),
            1250
        );
    }

    #[test]
    fn test_visibility_by_role() {
        assert_eq!(product_visibility(None), ProductVisibility::ActiveOnly);
        assert_eq!(
            product_visibility(Some(&user(UserRole::Admin))),
            ProductVisibility::All
        );
        assert_eq!(
            product_visibility(Some(&user(UserRole::Startup))),
            ProductVisibility::ActiveOrOwnedBy("u-1".to_owned())
        );
        assert_eq!(
            startup_visibility(&user(UserRole::Mentor)),
            StartupVisibility::VerifiedOnly
        );
    }

    #[test]
    fn test_page_bounds_are_clamped() {
        assert_eq!(page_bounds(None, None), (DEFAULT_PAGE_SIZE, 0));
        assert_eq!(page_bounds(Some(0), Some(-5)), (1, 0));
        assert_eq!(page_bounds(Some(10_000), Some(40)), (MAX_PAGE_SIZE, 40));
    }
}
