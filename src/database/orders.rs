// ABOUTME: Order and order item storage including the atomic placement and cancellation writes
// ABOUTME: Placement snapshots prices and decrements inventory conditionally inside one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use super::{now_timestamp, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    cents_to_decimal, line_total_cents, OrderStatus, ProductStatus, ShippingAddress,
};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, warn};
use uuid::Uuid;

/// Order line with its frozen unit price
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemRecord {
    /// Item ID
    pub id: String,
    /// Ordered product
    pub product_id: String,
    /// Product name at read time
    pub product_name: String,
    /// Units ordered
    pub quantity: i64,
    /// Price per unit captured when the order was placed
    pub unit_price: Decimal,
    /// `quantity * unit_price`
    pub total_price: Decimal,
}

/// Order with its line items
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    /// Order ID
    pub id: String,
    /// Generated order number
    pub order_number: String,
    /// Buyer
    pub user_id: String,
    /// Lifecycle status
    pub status: OrderStatus,
    /// Sum of the line totals at placement
    pub total_amount: Decimal,
    /// Delivery address
    pub shipping_address: ShippingAddress,
    /// Free-form buyer notes
    pub notes: String,
    /// Line items in insertion order
    pub items: Vec<OrderItemRecord>,
    /// Placement timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

/// Validated request for one product in a new order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    /// Product to buy
    pub product_id: String,
    /// Units, always positive
    pub quantity: i64,
}

struct PricedLine<'a> {
    line: &'a OrderLine,
    unit_price_cents: i64,
}

fn row_to_item(row: &SqliteRow) -> AppResult<OrderItemRecord> {
    let quantity: i64 = row.get("quantity");
    let unit_price_cents: i64 = row.get("unit_price_cents");
    Ok(OrderItemRecord {
        id: row.get("id"),
        product_id: row.get("product_id"),
        product_name: row.get("product_name"),
        quantity,
        unit_price: cents_to_decimal(unit_price_cents),
        total_price: cents_to_decimal(line_total_cents(unit_price_cents, quantity)?),
    })
}

fn row_to_order(row: &SqliteRow, items: Vec<OrderItemRecord>) -> AppResult<OrderRecord> {
    let shipping_address: String = row.get("shipping_address");
    Ok(OrderRecord {
        id: row.get("id"),
        order_number: row.get("order_number"),
        user_id: row.get("user_id"),
        status: row.get::<String, _>("status").parse()?,
        total_amount: cents_to_decimal(row.get("total_amount_cents")),
        shipping_address: serde_json::from_str(&shipping_address)?,
        notes: row.get("notes"),
        items,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

impl Database {
    pub(super) async fn migrate_orders(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                order_number TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                status TEXT NOT NULL DEFAULT 'PENDING' CHECK (status IN ('PENDING', 'CONFIRMED', 'SHIPPED', 'DELIVERED', 'CANCELLED', 'REFUNDED')),
                total_amount_cents INTEGER NOT NULL CHECK (total_amount_cents >= 0),
                shipping_address TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS order_items (
                id TEXT PRIMARY KEY,
                order_id TEXT NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
                product_id TEXT NOT NULL REFERENCES products(id),
                quantity INTEGER NOT NULL CHECK (quantity > 0),
                unit_price_cents INTEGER NOT NULL CHECK (unit_price_cents >= 0),
                UNIQUE (order_id, product_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id, created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Create an order with its items and reserve inventory, all or nothing
    ///
    /// Prices are read inside the transaction and frozen onto the items. Each
    /// decrement only applies while enough stock remains, so concurrent buyers
    /// can never drive inventory negative.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown or unavailable product or
    /// insufficient inventory, `ValueOutOfRange` if the total overflows, and a
    /// database error if any write fails. Nothing is persisted on error.
    pub async fn create_order(
        &self,
        user_id: &str,
        order_number: &str,
        shipping_address: &ShippingAddress,
        notes: &str,
        lines: &[OrderLine],
    ) -> AppResult<String> {
        let mut guard = self.begin_write().await?;

        let mut priced = Vec::with_capacity(lines.len());
        let mut total_cents: i64 = 0;
        for line in lines {
            let row = sqlx::query(
                "SELECT price_cents, status, inventory_count FROM products WHERE id = $1",
            )
            .bind(&line.product_id)
            .fetch_optional(guard.executor()?)
            .await?
            .ok_or_else(|| AppError::invalid_input("Invalid product selected."))?;

            let status: ProductStatus = row.get::<String, _>("status").parse()?;
            if !status.is_available(row.get("inventory_count")) {
                return Err(AppError::invalid_input(format!(
                    "Product {} is not available.",
                    line.product_id
                )));
            }

            let unit_price_cents: i64 = row.get("price_cents");
            total_cents = total_cents
                .checked_add(line_total_cents(unit_price_cents, line.quantity)?)
                .ok_or_else(|| AppError::out_of_range("Order total overflows"))?;
            priced.push(PricedLine {
                line,
                unit_price_cents,
            });
        }

        let order_id = Uuid::new_v4().to_string();
        let now = now_timestamp();
        sqlx::query(
            r"
            INSERT INTO orders (id, order_number, user_id, status, total_amount_cents, shipping_address, notes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(&order_id)
        .bind(order_number)
        .bind(user_id)
        .bind(OrderStatus::Pending.as_str())
        .bind(total_cents)
        .bind(serde_json::to_string(shipping_address)?)
        .bind(notes)
        .bind(&now)
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to create order: {e}")))?;

        for PricedLine {
            line,
            unit_price_cents,
        } in priced
        {
            sqlx::query(
                r"
                INSERT INTO order_items (id, order_id, product_id, quantity, unit_price_cents)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(unit_price_cents)
            .execute(guard.executor()?)
            .await
            .map_err(|e| AppError::database(format!("Failed to create order item: {e}")))?;

            let decremented = sqlx::query(
                r"
                UPDATE products
                SET inventory_count = inventory_count - $2, updated_at = $3
                WHERE id = $1 AND inventory_count >= $2
                ",
            )
            .bind(&line.product_id)
            .bind(line.quantity)
            .bind(&now)
            .execute(guard.executor()?)
            .await
            .map_err(|e| AppError::database(format!("Failed to reserve inventory: {e}")))?;

            if decremented.rows_affected() == 0 {
                warn!(
                    product_id = %line.product_id,
                    quantity = line.quantity,
                    "Insufficient inventory, rolling back order"
                );
                return Err(AppError::invalid_input(format!(
                    "Insufficient inventory for product {}.",
                    line.product_id
                )));
            }
        }

        guard.commit().await?;
        debug!(order_id = %order_id, total_cents, "Order transaction committed");
        Ok(order_id)
    }

    /// Mark a pending or confirmed order cancelled and return its stock
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the order is past the cancellable stages and
    /// a database error if any write fails
    pub async fn cancel_order_restoring_inventory(&self, order_id: &str) -> AppResult<()> {
        let mut guard = self.begin_write().await?;
        let now = now_timestamp();

        let cancelled = sqlx::query(
            r"
            UPDATE orders
            SET status = 'CANCELLED', updated_at = $2
            WHERE id = $1 AND status IN ('PENDING', 'CONFIRMED')
            ",
        )
        .bind(order_id)
        .bind(&now)
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to cancel order: {e}")))?;

        if cancelled.rows_affected() == 0 {
            return Err(AppError::invalid_input(
                "Order cannot be cancelled at this stage.",
            ));
        }

        sqlx::query(
            r"
            UPDATE products
            SET inventory_count = inventory_count + (
                    SELECT i.quantity FROM order_items i
                    WHERE i.order_id = $1 AND i.product_id = products.id
                ),
                updated_at = $2
            WHERE id IN (SELECT product_id FROM order_items WHERE order_id = $1)
            ",
        )
        .bind(order_id)
        .bind(&now)
        .execute(guard.executor()?)
        .await
        .map_err(|e| AppError::database(format!("Failed to restore inventory: {e}")))?;

        guard.commit().await
    }

    /// Move an order from `from` to `to`
    ///
    /// The update only applies if the stored status is still `from`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the stored status changed in the meantime
    pub async fn set_order_status(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET status = $3, updated_at = $4 WHERE id = $1 AND status = $2",
        )
        .bind(order_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(now_timestamp())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update order status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::invalid_input(format!("Order is no longer {from}.")));
        }
        Ok(())
    }

    async fn get_order_items(&self, order_id: &str) -> AppResult<Vec<OrderItemRecord>> {
        let rows = sqlx::query(
            r"
            SELECT i.id, i.product_id, p.name AS product_name, i.quantity, i.unit_price_cents
            FROM order_items i JOIN products p ON p.id = i.product_id
            WHERE i.order_id = $1
            ORDER BY i.rowid
            ",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get order items: {e}")))?;
        rows.iter().map(row_to_item).collect()
    }

    /// Get an order with its items
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_order(&self, order_id: &str) -> AppResult<Option<OrderRecord>> {
        let row = sqlx::query(
            r"
            SELECT id, order_number, user_id, status, total_amount_cents, shipping_address, notes, created_at, updated_at
            FROM orders WHERE id = $1
            ",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get order: {e}")))?;

        match row {
            Some(row) => {
                let items = self.get_order_items(order_id).await?;
                row_to_order(&row, items).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Orders newest first, restricted to one buyer unless `user_id` is `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn list_orders(&self, user_id: Option<&str>) -> AppResult<Vec<OrderRecord>> {
        let rows = sqlx::query(
            r"
            SELECT id, order_number, user_id, status, total_amount_cents, shipping_address, notes, created_at, updated_at
            FROM orders
            WHERE $1 IS NULL OR user_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list orders: {e}")))?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let order_id: String = row.get("id");
            let items = self.get_order_items(&order_id).await?;
            orders.push(row_to_order(row, items)?);
        }
        Ok(orders)
    }
}
