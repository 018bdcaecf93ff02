// ABOUTME: Order placement, cancellation, and admin status transitions
// ABOUTME: Validates requests before handing the atomic writes to the database layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::auth::AuthenticatedUser;
use crate::constants::orders::{ORDER_NUMBER_HEX_LENGTH, ORDER_NUMBER_PREFIX};
use crate::database::{Database, OrderLine, OrderRecord};
use crate::errors::{AppError, AppResult};
use crate::models::{OrderStatus, ShippingAddress};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

/// New order number: fixed prefix plus upper-case hex from a random UUID
#[must_use]
pub fn generate_order_number() -> String {
    let hex: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ORDER_NUMBER_HEX_LENGTH)
        .collect();
    format!("{ORDER_NUMBER_PREFIX}{}", hex.to_uppercase())
}

fn validate_lines(lines: &[OrderLine]) -> AppResult<()> {
    if lines.is_empty() {
        return Err(AppError::invalid_input(
            "Order must contain at least one item.",
        ));
    }

    let mut seen = HashSet::with_capacity(lines.len());
    for line in lines {
        if !seen.insert(line.product_id.as_str()) {
            return Err(AppError::invalid_input(
                "Duplicate products in order are not allowed.",
            ));
        }
        if line.quantity <= 0 {
            return Err(AppError::invalid_input(
                "Quantity must be greater than zero.",
            ));
        }
    }
    Ok(())
}

/// Order workflows over the shared database
pub struct OrderService<'a> {
    database: &'a Database,
}

impl<'a> OrderService<'a> {
    /// Create a service bound to a database
    #[must_use]
    pub const fn new(database: &'a Database) -> Self {
        Self { database }
    }

    /// Place an order for the caller
    ///
    /// The total is computed from current prices, never taken from the client.
    /// On any failure nothing is stored and inventory is unchanged.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank address field, an empty or
    /// duplicated item list, a non-positive quantity, an unknown or
    /// unavailable product, or insufficient inventory
    pub async fn place_order(
        &self,
        buyer: &AuthenticatedUser,
        shipping_address: &ShippingAddress,
        lines: &[OrderLine],
        notes: &str,
    ) -> AppResult<OrderRecord> {
        shipping_address.validate()?;
        validate_lines(lines)?;

        for line in lines {
            let product = self
                .database
                .get_product(&line.product_id)
                .await?
                .ok_or_else(|| AppError::invalid_input("Invalid product selected."))?;
            if !product.is_available {
                return Err(AppError::invalid_input(format!(
                    "Product {} is not available.",
                    product.name
                )));
            }
        }

        let order_number = generate_order_number();
        let order_id = self
            .database
            .create_order(&buyer.user_id, &order_number, shipping_address, notes, lines)
            .await?;

        let order = self
            .database
            .get_order(&order_id)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            user_id = %buyer.user_id,
            total = %order.total_amount,
            "Order placed"
        );
        Ok(order)
    }

    /// Fetch an order the caller may see
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the order does not exist or belongs to
    /// someone else and the caller is not an administrator
    pub async fn get_order(
        &self,
        actor: &AuthenticatedUser,
        order_id: &str,
    ) -> AppResult<OrderRecord> {
        self.database
            .get_order(order_id)
            .await?
            .filter(|order| actor.is_admin() || order.user_id == actor.user_id)
            .ok_or_else(|| AppError::not_found("Order"))
    }

    /// Orders visible to the caller, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_orders(&self, actor: &AuthenticatedUser) -> AppResult<Vec<OrderRecord>> {
        let owner = (!actor.is_admin()).then_some(actor.user_id.as_str());
        self.database.list_orders(owner).await
    }

    /// Cancel a pending or confirmed order and return its stock
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the caller cannot see the order and
    /// `InvalidInput` once the order has shipped or was already closed
    pub async fn cancel_order(
        &self,
        actor: &AuthenticatedUser,
        order_id: &str,
    ) -> AppResult<OrderRecord> {
        let order = self.get_order(actor, order_id).await?;
        if !order.status.is_cancellable() {
            warn!(order_id = %order.id, status = %order.status, "Rejected cancellation");
            return Err(AppError::invalid_input(
                "Order cannot be cancelled at this stage.",
            ));
        }

        self.database.cancel_order_restoring_inventory(&order.id).await?;
        info!(order_id = %order.id, user_id = %actor.user_id, "Order cancelled");

        self.get_order(actor, order_id).await
    }

    /// Move an order along its lifecycle (administrators only)
    ///
    /// Cancellation goes through [`Self::cancel_order`] so stock is restored.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` for non-admin callers, `ResourceNotFound` for
    /// an unknown order, and `InvalidInput` for a transition the lifecycle
    /// does not allow
    pub async fn update_order_status(
        &self,
        actor: &AuthenticatedUser,
        order_id: &str,
        new_status: OrderStatus,
    ) -> AppResult<OrderRecord> {
        actor.require_admin()?;
        let order = self.get_order(actor, order_id).await?;

        if !order.status.can_transition_to(new_status) {
            return Err(AppError::invalid_input(format!(
                "Cannot change order status from {} to {new_status}.",
                order.status
            )));
        }
        if new_status == OrderStatus::Cancelled {
            return self.cancel_order(actor, order_id).await;
        }

        self.database
            .set_order_status(&order.id, order.status, new_status)
            .await?;
        info!(order_id = %order.id, from = %order.status, to = %new_status, "Order status updated");

        self.get_order(actor, order_id).await
    }
}
