// ABOUTME: Order route handlers: placement, listing, detail, cancellation, and status changes
// ABOUTME: Thin HTTP layer over OrderService, which owns validation and the atomic writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::database::OrderLine;
use crate::errors::AppError;
use crate::middleware::require_auth;
use crate::models::{OrderStatus, ShippingAddress};
use crate::resources::ServerResources;
use crate::services::orders::OrderService;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// One requested line item
#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    /// Product to buy
    pub product_id: String,
    /// Units to buy
    pub quantity: i64,
}

/// Order placement request
///
/// Totals are never accepted from the client.
#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    /// Delivery address
    #[serde(default)]
    pub shipping_address: ShippingAddress,
    /// Requested items, also accepted as `order_items`
    #[serde(default, alias = "order_items")]
    pub items: Vec<OrderItemRequest>,
    /// Free-form notes
    #[serde(default)]
    pub notes: String,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    /// Target status
    pub status: String,
}

/// Order routes handler
pub struct OrderRoutes;

impl OrderRoutes {
    /// Create all order routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/marketplace/orders",
                get(Self::list_orders).post(Self::place_order),
            )
            .route("/api/marketplace/orders/:order_id", get(Self::get_order))
            .route(
                "/api/marketplace/orders/:order_id/cancel",
                post(Self::cancel_order),
            )
            .route(
                "/api/marketplace/orders/:order_id/status",
                put(Self::update_status),
            )
            .with_state(resources)
    }

    async fn place_order(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<PlaceOrderRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let lines: Vec<OrderLine> = request
            .items
            .into_iter()
            .map(|item| OrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();

        let order = OrderService::new(&resources.database)
            .place_order(&auth, &request.shipping_address, &lines, &request.notes)
            .await?;
        Ok((StatusCode::CREATED, Json(order)).into_response())
    }

    async fn list_orders(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let orders = OrderService::new(&resources.database)
            .list_orders(&auth)
            .await?;
        Ok(Json(orders).into_response())
    }

    async fn get_order(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(order_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let order = OrderService::new(&resources.database)
            .get_order(&auth, &order_id)
            .await?;
        Ok(Json(order).into_response())
    }

    async fn cancel_order(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(order_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let order = OrderService::new(&resources.database)
            .cancel_order(&auth, &order_id)
            .await?;
        Ok(Json(serde_json::json!({
            "success": true,
            "message": "Order cancelled successfully.",
            "order": order
        }))
        .into_response())
    }

    async fn update_status(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(order_id): Path<String>,
        Json(request): Json<UpdateOrderStatusRequest>,
    ) -> Result<Response, AppError> {
        let auth = require_auth(&headers, &resources).await?;
        let status: OrderStatus = request.status.trim().parse()?;
        let order = OrderService::new(&resources.database)
            .update_order_status(&auth, &order_id, status)
            .await?;
        Ok(Json(order).into_response())
    }
}
