// ABOUTME: Integration tests for atomic order placement and cancellation in OrderService
// ABOUTME: Verifies totals, inventory reservation, rollback on failure, and stock restoration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use rust_decimal::Decimal;
use startup_marketplace::{
    auth::AuthenticatedUser,
    database::OrderLine,
    errors::ErrorCode,
    models::{OrderStatus, UserRole},
    services::orders::OrderService,
};
use std::str::FromStr;

fn line(product_id: &str, quantity: i64) -> OrderLine {
    OrderLine {
        product_id: product_id.to_owned(),
        quantity,
    }
}

async fn inventory(resources: &startup_marketplace::resources::ServerResources, id: &str) -> i64 {
    resources
        .database
        .get_product(id)
        .await
        .unwrap()
        .unwrap()
        .inventory_count
}

#[tokio::test]
async fn test_place_order_computes_total_and_reserves_stock() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Widget", "99.99", 10)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let buyer = AuthenticatedUser::from(&buyer);

    let order = OrderService::new(&resources.database)
        .place_order(&buyer, &common::test_address(), &[line(&product.id, 2)], "")
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, Decimal::from_str("199.98").unwrap());
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].unit_price, Decimal::from_str("99.99").unwrap());
    assert_eq!(order.items[0].total_price, Decimal::from_str("199.98").unwrap());
    assert!(order.order_number.starts_with("ORD-"));
    assert_eq!(inventory(&resources, &product.id).await, 8);
}

#[tokio::test]
async fn test_price_change_does_not_alter_placed_order() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Lamp", "10.00", 5)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let buyer = AuthenticatedUser::from(&buyer);
    let service = OrderService::new(&resources.database);

    let order = service
        .place_order(&buyer, &common::test_address(), &[line(&product.id, 1)], "")
        .await
        .unwrap();

    resources
        .database
        .update_product(
            &product.id,
            &startup_marketplace::database::ProductUpdate {
                price_cents: Some(2500),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let reloaded = service.get_order(&buyer, &order.id).await.unwrap();
    assert_eq!(reloaded.total_amount, Decimal::from_str("10.00").unwrap());
    assert_eq!(reloaded.items[0].unit_price, Decimal::from_str("10.00").unwrap());
}

#[tokio::test]
async fn test_blank_city_rejected_without_side_effects() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Widget", "5.00", 3)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let buyer = AuthenticatedUser::from(&buyer);

    let mut address = common::test_address();
    address.city = "   ".to_owned();

    let err = OrderService::new(&resources.database)
        .place_order(&buyer, &address, &[line(&product.id, 1)], "")
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::MissingRequiredField);
    assert!(err.message.contains("city"));
    assert_eq!(inventory(&resources, &product.id).await, 3);
}

#[tokio::test]
async fn test_duplicate_and_empty_lines_rejected() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Widget", "5.00", 3)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let buyer = AuthenticatedUser::from(&buyer);
    let service = OrderService::new(&resources.database);

    let duplicate = service
        .place_order(
            &buyer,
            &common::test_address(),
            &[line(&product.id, 1), line(&product.id, 1)],
            "",
        )
        .await
        .unwrap_err();
    assert_eq!(duplicate.message, "Duplicate products in order are not allowed.");

    let empty = service
        .place_order(&buyer, &common::test_address(), &[], "")
        .await
        .unwrap_err();
    assert_eq!(empty.code, ErrorCode::InvalidInput);

    assert!(service.list_orders(&buyer).await.unwrap().is_empty());
    assert_eq!(inventory(&resources, &product.id).await, 3);
}

#[tokio::test]
async fn test_insufficient_inventory_rolls_back_every_line() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let plenty = common::create_test_product(&resources, &startup, "Pens", "1.50", 5)
        .await
        .unwrap();
    let scarce = common::create_test_product(&resources, &startup, "Desks", "120.00", 2)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let buyer = AuthenticatedUser::from(&buyer);
    let service = OrderService::new(&resources.database);

    let err = service
        .place_order(
            &buyer,
            &common::test_address(),
            &[line(&plenty.id, 1), line(&scarce.id, 10)],
            "",
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert!(err.message.starts_with("Insufficient inventory"));
    assert_eq!(inventory(&resources, &plenty.id).await, 5);
    assert_eq!(inventory(&resources, &scarce.id).await, 2);
    assert!(service.list_orders(&buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_and_unavailable_products_rejected() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let sold_out = common::create_test_product(&resources, &startup, "Gone", "3.00", 0)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let buyer = AuthenticatedUser::from(&buyer);
    let service = OrderService::new(&resources.database);

    let unknown = service
        .place_order(&buyer, &common::test_address(), &[line("nope", 1)], "")
        .await
        .unwrap_err();
    assert_eq!(unknown.message, "Invalid product selected.");

    let unavailable = service
        .place_order(&buyer, &common::test_address(), &[line(&sold_out.id, 1)], "")
        .await
        .unwrap_err();
    assert_eq!(unavailable.message, "Product Gone is not available.");
}

#[tokio::test]
async fn test_cancel_pending_order_restores_inventory() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Widget", "99.99", 10)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let buyer = AuthenticatedUser::from(&buyer);
    let service = OrderService::new(&resources.database);

    let order = service
        .place_order(&buyer, &common::test_address(), &[line(&product.id, 3)], "")
        .await
        .unwrap();
    assert_eq!(inventory(&resources, &product.id).await, 7);

    let cancelled = service.cancel_order(&buyer, &order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(inventory(&resources, &product.id).await, 10);

    let again = service.cancel_order(&buyer, &order.id).await.unwrap_err();
    assert_eq!(again.code, ErrorCode::InvalidInput);
    assert_eq!(inventory(&resources, &product.id).await, 10);
}

#[tokio::test]
async fn test_cancel_shipped_order_fails() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Widget", "4.00", 4)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let buyer = AuthenticatedUser::from(&buyer);
    let admin = common::create_test_user(&resources, UserRole::Admin)
        .await
        .unwrap();
    let admin = AuthenticatedUser::from(&admin);
    let service = OrderService::new(&resources.database);

    let order = service
        .place_order(&buyer, &common::test_address(), &[line(&product.id, 2)], "")
        .await
        .unwrap();
    service
        .update_order_status(&admin, &order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    service
        .update_order_status(&admin, &order.id, OrderStatus::Shipped)
        .await
        .unwrap();

    let err = service.cancel_order(&buyer, &order.id).await.unwrap_err();
    assert_eq!(err.message, "Order cannot be cancelled at this stage.");
    assert_eq!(inventory(&resources, &product.id).await, 2);
}

#[tokio::test]
async fn test_admin_cancellation_restores_stock() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Widget", "4.00", 4)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let admin = common::create_test_user(&resources, UserRole::Admin)
        .await
        .unwrap();
    let admin = AuthenticatedUser::from(&admin);
    let service = OrderService::new(&resources.database);

    let order = service
        .place_order(
            &AuthenticatedUser::from(&buyer),
            &common::test_address(),
            &[line(&product.id, 4)],
            "",
        )
        .await
        .unwrap();
    assert_eq!(inventory(&resources, &product.id).await, 0);

    let cancelled = service
        .update_order_status(&admin, &order.id, OrderStatus::Cancelled)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(inventory(&resources, &product.id).await, 4);

    let skip = service
        .update_order_status(&admin, &order.id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert_eq!(skip.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_orders_hidden_from_other_buyers() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Widget", "4.00", 4)
        .await
        .unwrap();
    let owner = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let owner = AuthenticatedUser::from(&owner);
    let other = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let other = AuthenticatedUser::from(&other);
    let service = OrderService::new(&resources.database);

    let order = service
        .place_order(&owner, &common::test_address(), &[line(&product.id, 1)], "")
        .await
        .unwrap();

    let err = service.get_order(&other, &order.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
    assert!(service.list_orders(&other).await.unwrap().is_empty());

    let cancel = service.cancel_order(&other, &order.id).await.unwrap_err();
    assert_eq!(cancel.code, ErrorCode::ResourceNotFound);
}
