// ABOUTME: Storage for categories, startup profiles, products, and product reviews
// ABOUTME: Product listing supports role-based visibility, filters, search, and paging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::{now_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{cents_to_decimal, ProductStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

// ============================================================================
// Record Types
// ============================================================================

/// Product category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRecord {
    /// Category ID
    pub id: String,
    /// Unique name
    pub name: String,
    /// Description
    pub description: String,
    /// Whether the category accepts products and is listed
    pub is_active: bool,
    /// Number of active products in the category
    pub product_count: i64,
    /// Creation timestamp
    pub created_at: String,
}

/// Company profile owned by a startup account
#[derive(Debug, Clone, Serialize)]
pub struct StartupProfileRecord {
    /// Profile ID
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Company name
    pub company_name: String,
    /// Company website
    pub website: String,
    /// Logo location
    pub logo_url: String,
    /// Company description
    pub description: String,
    /// Founding date (`YYYY-MM-DD`)
    pub founded_date: Option<String>,
    /// Verified by an administrator
    pub verified: bool,
    /// Number of active products
    pub product_count: i64,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Product with its owner, category, and rating summary
#[derive(Debug, Clone, Serialize)]
pub struct ProductRecord {
    /// Product ID
    pub id: String,
    /// Owning startup profile
    pub startup_id: String,
    /// Owning startup's company name
    pub startup_name: String,
    /// User that owns the startup profile
    pub owner_id: String,
    /// Category, if any
    pub category_id: Option<String>,
    /// Category name, if any
    pub category_name: Option<String>,
    /// Product name
    pub name: String,
    /// Description
    pub description: String,
    /// Unit price
    pub price: Decimal,
    /// Units in stock
    pub inventory_count: i64,
    /// Image locations
    pub image_urls: Vec<String>,
    /// Listing status
    pub status: ProductStatus,
    /// Featured products sort first
    pub featured: bool,
    /// Active and in stock
    pub is_available: bool,
    /// Mean review rating rounded to one decimal
    pub average_rating: Option<f64>,
    /// Number of reviews
    pub review_count: i64,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Product review
#[derive(Debug, Clone, Serialize)]
pub struct ReviewRecord {
    /// Review ID
    pub id: String,
    /// Reviewed product
    pub product_id: String,
    /// Reviewer
    pub user_id: String,
    /// Reviewer's username
    pub username: String,
    /// Rating from 1 to 5
    pub rating: i64,
    /// Headline
    pub title: String,
    /// Body
    pub comment: String,
    /// Reviewer had a delivered order containing the product
    pub is_verified_purchase: bool,
    /// Creation timestamp
    pub created_at: String,
}

/// Fields for a new product
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Category, if any
    pub category_id: Option<String>,
    /// Product name
    pub name: String,
    /// Description
    pub description: String,
    /// Unit price in cents
    pub price_cents: i64,
    /// Initial stock
    pub inventory_count: i64,
    /// Image locations
    pub image_urls: Vec<String>,
    /// Initial status
    pub status: ProductStatus,
    /// Featured flag
    pub featured: bool,
}

/// Partial product update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    /// New category
    pub category_id: Option<String>,
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New unit price in cents
    pub price_cents: Option<i64>,
    /// New stock level
    pub inventory_count: Option<i64>,
    /// New image list
    pub image_urls: Option<Vec<String>>,
    /// New status
    pub status: Option<ProductStatus>,
    /// New featured flag
    pub featured: Option<bool>,
}

/// Which products a viewer may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductVisibility {
    /// Everything (administrators)
    All,
    /// Active products plus the given user's own products (startups)
    ActiveOrOwnedBy(String),
    /// Active products only
    ActiveOnly,
}

/// Which startup profiles a viewer may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupVisibility {
    /// Everything (administrators)
    All,
    /// Only the given user's own profile (startups)
    OwnedBy(String),
    /// Verified profiles only
    VerifiedOnly,
}

/// Product listing filter
#[derive(Debug, Clone)]
pub struct ProductFilter {
    /// Visibility rule derived from the viewer's role
    pub visibility: ProductVisibility,
    /// Restrict to a category
    pub category_id: Option<String>,
    /// Restrict to a status
    pub status: Option<ProductStatus>,
    /// Restrict by featured flag
    pub featured: Option<bool>,
    /// Lower price bound in cents, inclusive
    pub min_price_cents: Option<i64>,
    /// Upper price bound in cents, inclusive
    pub max_price_cents: Option<i64>,
    /// Only products with positive inventory
    pub in_stock: Option<bool>,
    /// Case-insensitive search over name, description, and company name
    pub search: Option<String>,
    /// Page size
    pub limit: i64,
    /// Rows to skip
    pub offset: i64,
}

impl ProductFilter {
    /// Unfiltered first page for the given visibility
    #[must_use]
    pub const fn new(visibility: ProductVisibility, limit: i64) -> Self {
        Self {
            visibility,
            category_id: None,
            status: None,
            featured: None,
            min_price_cents: None,
            max_price_cents: None,
            in_stock: None,
            search: None,
            limit,
            offset: 0,
        }
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.startup_id, s.company_name AS startup_name, s.user_id AS owner_id,
           p.category_id, c.name AS category_name, p.name, p.description, p.price_cents,
           p.inventory_count, p.image_urls, p.status, p.featured, p.created_at, p.updated_at,
           (SELECT AVG(r.rating) FROM product_reviews r WHERE r.product_id = p.id) AS average_rating,
           (SELECT COUNT(*) FROM product_reviews r WHERE r.product_id = p.id) AS review_count
    FROM products p
    JOIN startup_profiles s ON s.id = p.startup_id
    LEFT JOIN categories c ON c.id = p.category_id
";

const STARTUP_SELECT: &str = r"
    SELECT s.id, s.user_id, s.company_name, s.website, s.logo_url, s.description, s.founded_date,
           s.verified, s.created_at, s.updated_at,
           (SELECT COUNT(*) FROM products p WHERE p.startup_id = s.id AND p.status = 'ACTIVE') AS product_count
    FROM startup_profiles s
";

const CATEGORY_SELECT: &str = r"
    SELECT c.id, c.name, c.description, c.is_active, c.created_at,
           (SELECT COUNT(*) FROM products p WHERE p.category_id = c.id AND p.status = 'ACTIVE') AS product_count
    FROM categories c
";

fn round_rating(average: f64) -> f64 {
    (average * 10.0).round() / 10.0
}

fn row_to_product(row: &SqliteRow) -> AppResult<ProductRecord> {
    let status: ProductStatus = row.get::<String, _>("status").parse()?;
    let inventory_count: i64 = row.get("inventory_count");
    let image_urls: String = row.get("image_urls");
    let average: Option<f64> = row.get("average_rating");

    Ok(ProductRecord {
        id: row.get("id"),
        startup_id: row.get("startup_id"),
        startup_name: row.get("startup_name"),
        owner_id: row.get("owner_id"),
        category_id: row.get("category_id"),
        category_name: row.get("category_name"),
        name: row.get("name"),
        description: row.get("description"),
        price: cents_to_decimal(row.get("price_cents")),
        inventory_count,
        image_urls: serde_json::from_str(&image_urls)?,
        status,
        featured: row.get("featured"),
        is_available: status.is_available(inventory_count),
        average_rating: average.map(round_rating),
        review_count: row.get("review_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_startup(row: &SqliteRow) -> StartupProfileRecord {
    StartupProfileRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        company_name: row.get("company_name"),
        website: row.get("website"),
        logo_url: row.get("logo_url"),
        description: row.get("description"),
        founded_date: row.get("founded_date"),
        verified: row.get("verified"),
        product_count: row.get("product_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_category(row: &SqliteRow) -> CategoryRecord {
    CategoryRecord {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        is_active: row.get("is_active"),
        product_count: row.get("product_count"),
        created_at: row.get("created_at"),
    }
}

fn row_to_review(row: &SqliteRow) -> ReviewRecord {
    ReviewRecord {
        id: row.get("id"),
        product_id: row.get("product_id"),
        user_id: row.get("user_id"),
        username: row.get("username"),
        rating: row.get("rating"),
        title: row.get("title"),
        comment: row.get("comment"),
        is_verified_purchase: row.get("is_verified_purchase"),
        created_at: row.get("created_at"),
    }
}

fn map_unique_violation(error: sqlx::Error, message: &str) -> AppError {
    match &error {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::already_exists(message)
        }
        _ => AppError::from(error),
    }
}

impl Database {
    pub(super) async fn migrate_marketplace(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS startup_profiles (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                company_name TEXT NOT NULL,
                website TEXT NOT NULL DEFAULT '',
                logo_url TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                founded_date TEXT,
                verified BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS products (
                id TEXT PRIMARY KEY,
                startup_id TEXT NOT NULL REFERENCES startup_profiles(id) ON DELETE CASCADE,
                category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
                inventory_count INTEGER NOT NULL DEFAULT 0 CHECK (inventory_count >= 0),
                image_urls TEXT NOT NULL DEFAULT '[]',
                status TEXT NOT NULL DEFAULT 'DRAFT' CHECK (status IN ('DRAFT', 'ACTIVE', 'INACTIVE', 'OUT_OF_STOCK')),
                featured BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS product_reviews (
                id TEXT PRIMARY KEY,
                product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                title TEXT NOT NULL,
                comment TEXT NOT NULL,
                is_verified_purchase BOOLEAN NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE (product_id, user_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_status ON products(status)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_startup ON products(startup_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Create a category
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the name is taken
    pub async fn create_category(
        &self,
        name: &str,
        description: &str,
    ) -> AppResult<CategoryRecord> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&id)
        .bind(name)
        .bind(description)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A category with this name already exists."))?;

        self.get_category(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))
    }

    /// Get a category by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_category(&self, category_id: &str) -> AppResult<Option<CategoryRecord>> {
        let row = sqlx::query(&format!("{CATEGORY_SELECT} WHERE c.id = $1"))
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get category: {e}")))?;
        Ok(row.as_ref().map(row_to_category))
    }

    /// List categories ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_categories(&self, include_inactive: bool) -> AppResult<Vec<CategoryRecord>> {
        let rows = sqlx::query(&format!(
            "{CATEGORY_SELECT} WHERE c.is_active = 1 OR $1 ORDER BY c.name"
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list categories: {e}")))?;
        Ok(rows.iter().map(row_to_category).collect())
    }

    /// Update a category; `None` leaves a field unchanged
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the category does not exist
    pub async fn update_category(
        &self,
        category_id: &str,
        name: Option<&str>,
        description: Option<&str>,
        is_active: Option<bool>,
    ) -> AppResult<CategoryRecord> {
        let result = sqlx::query(
            r"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            ",
        )
        .bind(category_id)
        .bind(name)
        .bind(description)
        .bind(is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A category with this name already exists."))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Category"));
        }
        self.get_category(category_id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))
    }

    // ========================================================================
    // Startup Profiles
    // ========================================================================

    /// Create the startup profile for a user
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the user already has one
    pub async fn create_startup_profile(
        &self,
        user_id: &str,
        company_name: &str,
        website: &str,
        logo_url: &str,
        description: &str,
        founded_date: Option<&str>,
    ) -> AppResult<StartupProfileRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();
        sqlx::query(
            r"
            INSERT INTO startup_profiles (id, user_id, company_name, website, logo_url, description, founded_date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(company_name)
        .bind(website)
        .bind(logo_url)
        .bind(description)
        .bind(founded_date)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Startup profile already exists for this user."))?;

        self.get_startup_profile(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Startup profile"))
    }

    /// Get a startup profile by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_startup_profile(
        &self,
        profile_id: &str,
    ) -> AppResult<Option<StartupProfileRecord>> {
        let row = sqlx::query(&format!("{STARTUP_SELECT} WHERE s.id = $1"))
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get startup profile: {e}")))?;
        Ok(row.as_ref().map(row_to_startup))
    }

    /// Get the startup profile owned by a user
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_startup_profile_by_user(
        &self,
        user_id: &str,
    ) -> AppResult<Option<StartupProfileRecord>> {
        let row = sqlx::query(&format!("{STARTUP_SELECT} WHERE s.user_id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get startup profile: {e}")))?;
        Ok(row.as_ref().map(row_to_startup))
    }

    /// List startup profiles visible to a viewer, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_startup_profiles(
        &self,
        visibility: &StartupVisibility,
    ) -> AppResult<Vec<StartupProfileRecord>> {
        let mut query = QueryBuilder::<Sqlite>::new(STARTUP_SELECT);
        match visibility {
            StartupVisibility::All => {}
            StartupVisibility::OwnedBy(user_id) => {
                query.push(" WHERE s.user_id = ");
                query.push_bind(user_id.clone());
            }
            StartupVisibility::VerifiedOnly => {
                query.push(" WHERE s.verified = 1");
            }
        }
        query.push(" ORDER BY s.created_at DESC");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list startup profiles: {e}")))?;
        Ok(rows.iter().map(row_to_startup).collect())
    }

    /// Update a startup profile; `None` leaves a field unchanged
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the profile does not exist
    pub async fn update_startup_profile(
        &self,
        profile_id: &str,
        company_name: Option<&str>,
        website: Option<&str>,
        logo_url: Option<&str>,
        description: Option<&str>,
        founded_date: Option<&str>,
    ) -> AppResult<StartupProfileRecord> {
        let result = sqlx::query(
            r"
            UPDATE startup_profiles
            SET company_name = COALESCE($2, company_name),
                website = COALESCE($3, website),
                logo_url = COALESCE($4, logo_url),
                description = COALESCE($5, description),
                founded_date = COALESCE($6, founded_date),
                updated_at = $7
            WHERE id = $1
            ",
        )
        .bind(profile_id)
        .bind(company_name)
        .bind(website)
        .bind(logo_url)
        .bind(description)
        .bind(founded_date)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update startup profile: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Startup profile"));
        }
        self.get_startup_profile(profile_id)
            .await?
            .ok_or_else(|| AppError::not_found("Startup profile"))
    }

    /// Set the verified flag on a startup profile
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the profile does not exist
    pub async fn set_startup_verified(
        &self,
        profile_id: &str,
        verified: bool,
    ) -> AppResult<StartupProfileRecord> {
        let result =
            sqlx::query("UPDATE startup_profiles SET verified = $2, updated_at = $3 WHERE id = $1")
                .bind(profile_id)
                .bind(verified)
                .bind(now_timestamp())
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to verify startup: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Startup profile"));
        }
        self.get_startup_profile(profile_id)
            .await?
            .ok_or_else(|| AppError::not_found("Startup profile"))
    }

    // ========================================================================
    // Products
    // ========================================================================

    /// Create a product for a startup
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn create_product(
        &self,
        startup_id: &str,
        product: &NewProduct,
    ) -> AppResult<ProductRecord> {
        let id = Uuid::new_v4().to_string();
        let now = now_timestamp();
        sqlx::query(
            r"
            INSERT INTO products (id, startup_id, category_id, name, description, price_cents, inventory_count, image_urls, status, featured, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            ",
        )
        .bind(&id)
        .bind(startup_id)
        .bind(product.category_id.as_deref())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.inventory_count)
        .bind(serde_json::to_string(&product.image_urls)?)
        .bind(product.status.as_str())
        .bind(product.featured)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create product: {e}")))?;

        self.get_product(&id)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))
    }

    /// Get a product by ID regardless of visibility
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_product(&self, product_id: &str) -> AppResult<Option<ProductRecord>> {
        let row = sqlx::query(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get product: {e}")))?;
        row.as_ref().map(row_to_product).transpose()
    }

    /// List products matching a filter, featured first then newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<ProductRecord>> {
        let mut query = QueryBuilder::<Sqlite>::new(PRODUCT_SELECT);
        query.push(" WHERE 1 = 1");

        match &filter.visibility {
            ProductVisibility::All => {}
            ProductVisibility::ActiveOrOwnedBy(user_id) => {
                query.push(" AND (p.status = 'ACTIVE' OR s.user_id = ");
                query.push_bind(user_id.clone());
                query.push(")");
            }
            ProductVisibility::ActiveOnly => {
                query.push(" AND p.status = 'ACTIVE'");
            }
        }
        if let Some(category_id) = &filter.category_id {
            query.push(" AND p.category_id = ");
            query.push_bind(category_id.clone());
        }
        if let Some(status) = filter.status {
            query.push(" AND p.status = ");
            query.push_bind(status.as_str());
        }
        if let Some(featured) = filter.featured {
            query.push(" AND p.featured = ");
            query.push_bind(featured);
        }
        if let Some(min) = filter.min_price_cents {
            query.push(" AND p.price_cents >= ");
            query.push_bind(min);
        }
        if let Some(max) = filter.max_price_cents {
            query.push(" AND p.price_cents <= ");
            query.push_bind(max);
        }
        if filter.in_stock == Some(true) {
            query.push(" AND p.inventory_count > 0");
        }
        if let Some(search) = filter.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                let pattern = format!("%{search}%");
                query.push(" AND (p.name LIKE ");
                query.push_bind(pattern.clone());
                query.push(" OR p.description LIKE ");
                query.push_bind(pattern.clone());
                query.push(" OR s.company_name LIKE ");
                query.push_bind(pattern);
                query.push(")");
            }
        }

        query.push(" ORDER BY p.featured DESC, p.created_at DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list products: {e}")))?;
        rows.iter().map(row_to_product).collect()
    }

    /// Apply a partial update to a product
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the product does not exist
    pub async fn update_product(
        &self,
        product_id: &str,
        update: &ProductUpdate,
    ) -> AppResult<ProductRecord> {
        let image_urls = update
            .image_urls
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r"
            UPDATE products
            SET category_id = COALESCE($2, category_id),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price_cents = COALESCE($5, price_cents),
                inventory_count = COALESCE($6, inventory_count),
                image_urls = COALESCE($7, image_urls),
                status = COALESCE($8, status),
                featured = COALESCE($9, featured),
                updated_at = $10
            WHERE id = $1
            ",
        )
        .bind(product_id)
        .bind(update.category_id.as_deref())
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.price_cents)
        .bind(update.inventory_count)
        .bind(image_urls)
        .bind(update.status.map(ProductStatus::as_str))
        .bind(update.featured)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update product: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Product"));
        }
        self.get_product(product_id)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))
    }

    /// Delete a product that has never been ordered
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if order items still reference the product and
    /// `ResourceNotFound` if it does not exist
    pub async fn delete_product(&self, product_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(product_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                    AppError::invalid_input(
                        "Product has orders and cannot be deleted; set it INACTIVE instead.",
                    )
                }
                _ => AppError::database(format!("Failed to delete product: {e}")),
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Product"));
        }
        Ok(())
    }

    // ========================================================================
    // Reviews
    // ========================================================================

    /// Record a review; one per user and product
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the user already reviewed the product
    pub async fn create_review(
        &self,
        product_id: &str,
        user_id: &str,
        rating: i64,
        title: &str,
        comment: &str,
        is_verified_purchase: bool,
    ) -> AppResult<ReviewRecord> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r"
            INSERT INTO product_reviews (id, product_id, user_id, rating, title, comment, is_verified_purchase, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(&id)
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(title)
        .bind(comment)
        .bind(is_verified_purchase)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::invalid_input("You have already reviewed this product.")
            }
            _ => AppError::database(format!("Failed to create review: {e}")),
        })?;

        let row = sqlx::query(
            r"
            SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.title, r.comment,
                   r.is_verified_purchase, r.created_at
            FROM product_reviews r JOIN users u ON u.id = r.user_id
            WHERE r.id = $1
            ",
        )
        .bind(&id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row_to_review(&row))
    }

    /// Reviews for a product, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_product_reviews(
        &self,
        product_id: &str,
        limit: Option<i64>,
    ) -> AppResult<Vec<ReviewRecord>> {
        let rows = sqlx::query(
            r"
            SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.title, r.comment,
                   r.is_verified_purchase, r.created_at
            FROM product_reviews r JOIN users u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            LIMIT $2
            ",
        )
        .bind(product_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list reviews: {e}")))?;
        Ok(rows.iter().map(row_to_review).collect())
    }

    /// Reviews written by a user, or every review when `user_id` is `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_reviews_by_user(
        &self,
        user_id: Option<&str>,
    ) -> AppResult<Vec<ReviewRecord>> {
        let rows = sqlx::query(
            r"
            SELECT r.id, r.product_id, r.user_id, u.username, r.rating, r.title, r.comment,
                   r.is_verified_purchase, r.created_at
            FROM product_reviews r JOIN users u ON u.id = r.user_id
            WHERE $1 IS NULL OR r.user_id = $1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list reviews: {e}")))?;
        Ok(rows.iter().map(row_to_review).collect())
    }

    /// Whether the user has a delivered order containing the product
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn has_delivered_purchase(&self, user_id: &str, product_id: &str) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM order_items i JOIN orders o ON o.id = i.order_id
            WHERE o.user_id = $1 AND i.product_id = $2 AND o.status = 'DELIVERED'
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to check purchase: {e}")))?;
        Ok(count > 0)
    }
}
