// ABOUTME: Integration tests for catalog routes: categories, startup profiles, products, reviews
// ABOUTME: Checks role-based visibility, ownership rules, and verified-purchase reviews
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use startup_marketplace::{
    auth::AuthenticatedUser,
    database::OrderLine,
    models::{OrderStatus, UserRole},
    routes::build_router,
    services::orders::OrderService,
};

#[tokio::test]
async fn test_categories_are_admin_managed() {
    let resources = common::create_test_server_resources().await.unwrap();
    let admin = common::create_test_user(&resources, UserRole::Admin).await.unwrap();
    let student = common::create_test_user(&resources, UserRole::Student).await.unwrap();
    let admin_token = common::bearer(&resources, &admin).unwrap();

    AxumTestRequest::post("/api/marketplace/categories")
        .auth(&common::bearer(&resources, &student).unwrap())
        .json(&json!({ "name": "Hardware" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let category: Value = AxumTestRequest::post("/api/marketplace/categories")
        .auth(&admin_token)
        .json(&json!({ "name": "Hardware", "description": "Physical goods" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    let category_id = category["id"].as_str().unwrap();

    AxumTestRequest::post("/api/marketplace/categories")
        .auth(&admin_token)
        .json(&json!({ "name": "Hardware" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::CONFLICT);

    AxumTestRequest::delete(&format!("/api/marketplace/categories/{category_id}"))
        .auth(&admin_token)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let listed: Value = AxumTestRequest::get("/api/marketplace/categories")
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_only_startups_create_profiles_and_products() {
    let resources = common::create_test_server_resources().await.unwrap();
    let student = common::create_test_user(&resources, UserRole::Student).await.unwrap();
    let founder = common::create_test_user(&resources, UserRole::Startup).await.unwrap();
    let student_token = common::bearer(&resources, &student).unwrap();
    let founder_token = common::bearer(&resources, &founder).unwrap();

    AxumTestRequest::post("/api/marketplace/startup-profiles")
        .auth(&student_token)
        .json(&json!({ "company_name": "Nope Inc" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let no_profile = AxumTestRequest::post("/api/marketplace/products")
        .auth(&founder_token)
        .json(&json!({ "name": "Widget", "price": "9.99", "inventory_count": 3 }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    let body: Value = no_profile.json();
    assert_eq!(
        body["error"]["message"],
        "User must have a startup profile to create products."
    );

    AxumTestRequest::post("/api/marketplace/startup-profiles")
        .auth(&founder_token)
        .json(&json!({ "company_name": "Acme", "founded_date": "2024-02-30" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let profile: Value = AxumTestRequest::post("/api/marketplace/startup-profiles")
        .auth(&founder_token)
        .json(&json!({ "company_name": "Acme", "founded_date": "2024-02-01" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(profile["verified"], false);

    AxumTestRequest::post("/api/marketplace/products")
        .auth(&founder_token)
        .json(&json!({ "name": "Widget", "price": "0", "inventory_count": 3 }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/marketplace/products")
        .auth(&founder_token)
        .json(&json!({ "name": "Widget", "price": "9.99", "inventory_count": -1 }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let product: Value = AxumTestRequest::post("/api/marketplace/products")
        .auth(&founder_token)
        .json(&json!({ "name": "Widget", "price": "9.99", "inventory_count": 3 }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(product["status"], "DRAFT");
    assert_eq!(product["price"], "9.99");
    assert_eq!(product["is_available"], false);

    AxumTestRequest::post("/api/marketplace/products")
        .auth(&student_token)
        .json(&json!({ "name": "Widget", "price": "9.99" }))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_draft_products_visible_only_to_owner_and_admin() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (founder, startup) = common::create_test_startup(&resources).await.unwrap();
    let draft = resources
        .database
        .create_product(
            &startup.id,
            &startup_marketplace::database::NewProduct {
                category_id: None,
                name: "Prototype".to_owned(),
                description: String::new(),
                price_cents: 500,
                inventory_count: 1,
                image_urls: Vec::new(),
                status: startup_marketplace::models::ProductStatus::Draft,
                featured: false,
            },
        )
        .await
        .unwrap();
    let active = common::create_test_product(&resources, &startup, "Gadget", "25.00", 4)
        .await
        .unwrap();
    let admin = common::create_test_user(&resources, UserRole::Admin).await.unwrap();

    AxumTestRequest::get(&format!("/api/marketplace/products/{}", draft.id))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    AxumTestRequest::get(&format!("/api/marketplace/products/{}", draft.id))
        .auth(&common::bearer(&resources, &founder).unwrap())
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK);

    let anonymous: Value = AxumTestRequest::get("/api/marketplace/products")
        .send(build_router(resources.clone()))
        .await
        .json();
    assert_eq!(anonymous["total"], 1);
    assert_eq!(anonymous["products"][0]["id"], active.id.as_str());

    let as_admin: Value = AxumTestRequest::get("/api/marketplace/products")
        .auth(&common::bearer(&resources, &admin).unwrap())
        .send(build_router(resources.clone()))
        .await
        .json();
    assert_eq!(as_admin["total"], 2);

    let searched: Value = AxumTestRequest::get("/api/marketplace/products?search=gadg&limit=500")
        .send(build_router(resources))
        .await
        .json();
    assert_eq!(searched["total"], 1);
    assert_eq!(searched["limit"], 100);
}

#[tokio::test]
async fn test_startup_cannot_modify_another_startups_product() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Gadget", "25.00", 4)
        .await
        .unwrap();
    let (rival, _) = common::create_test_startup(&resources).await.unwrap();
    let rival_token = common::bearer(&resources, &rival).unwrap();

    let response = AxumTestRequest::put(&format!("/api/marketplace/products/{}", product.id))
        .auth(&rival_token)
        .json(&json!({ "price": "1.00" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.error_code(), "PERMISSION_DENIED");

    AxumTestRequest::delete(&format!("/api/marketplace/products/{}", product.id))
        .auth(&rival_token)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let unchanged = resources.database.get_product(&product.id).await.unwrap().unwrap();
    assert_eq!(unchanged.price.to_string(), "25.00");
}

#[tokio::test]
async fn test_owner_updates_and_deletes_product() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (founder, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Gadget", "25.00", 4)
        .await
        .unwrap();
    let token = common::bearer(&resources, &founder).unwrap();

    let updated: Value = AxumTestRequest::put(&format!("/api/marketplace/products/{}", product.id))
        .auth(&token)
        .json(&json!({ "price": "30.50", "inventory_count": 9, "featured": true }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["price"], "30.50");
    assert_eq!(updated["inventory_count"], 9);
    assert_eq!(updated["featured"], true);

    AxumTestRequest::put(&format!("/api/marketplace/products/{}", product.id))
        .auth(&token)
        .json(&json!({ "category_id": "missing" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::delete(&format!("/api/marketplace/products/{}", product.id))
        .auth(&token)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    assert!(resources.database.get_product(&product.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_students_see_only_verified_startups() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, verified) = common::create_test_startup(&resources).await.unwrap();
    let founder = common::create_test_user(&resources, UserRole::Startup).await.unwrap();
    let pending = resources
        .database
        .create_startup_profile(&founder.id, "Stealth", "", "", "", None)
        .await
        .unwrap();
    let student = common::create_test_user(&resources, UserRole::Student).await.unwrap();
    let student_token = common::bearer(&resources, &student).unwrap();

    let listed: Value = AxumTestRequest::get("/api/marketplace/startup-profiles")
        .auth(&student_token)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    let ids: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, [verified.id.as_str()]);

    AxumTestRequest::get(&format!("/api/marketplace/startup-profiles/{}", pending.id))
        .auth(&student_token)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    AxumTestRequest::post(&format!("/api/marketplace/startup-profiles/{}/verify", pending.id))
        .auth(&student_token)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let admin = common::create_test_user(&resources, UserRole::Admin).await.unwrap();
    let verified_now: Value =
        AxumTestRequest::post(&format!("/api/marketplace/startup-profiles/{}/verify", pending.id))
            .auth(&common::bearer(&resources, &admin).unwrap())
            .send(build_router(resources))
            .await
            .assert_status(StatusCode::OK)
            .json();
    assert_eq!(verified_now["verified"], true);
}

#[tokio::test]
async fn test_reviews_flag_verified_purchases() {
    let resources = common::create_test_server_resources().await.unwrap();
    let (_, startup) = common::create_test_startup(&resources).await.unwrap();
    let product = common::create_test_product(&resources, &startup, "Gadget", "25.00", 4)
        .await
        .unwrap();
    let buyer = common::create_test_user(&resources, UserRole::Student).await.unwrap();
    let browser = common::create_test_user(&resources, UserRole::Student).await.unwrap();
    let admin = common::create_test_user(&resources, UserRole::Admin).await.unwrap();
    let admin = AuthenticatedUser::from(&admin);

    let service = OrderService::new(&resources.database);
    let order = service
        .place_order(
            &AuthenticatedUser::from(&buyer),
            &common::test_address(),
            &[OrderLine {
                product_id: product.id.clone(),
                quantity: 1,
            }],
            "",
        )
        .await
        .unwrap();
    for status in [OrderStatus::Confirmed, OrderStatus::Shipped, OrderStatus::Delivered] {
        service
            .update_order_status(&admin, &order.id, status)
            .await
            .unwrap();
    }

    let uri = format!("/api/marketplace/products/{}/reviews", product.id);

    AxumTestRequest::post(&uri)
        .auth(&common::bearer(&resources, &buyer).unwrap())
        .json(&json!({ "rating": 6, "title": "Too good" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let verified: Value = AxumTestRequest::post(&uri)
        .auth(&common::bearer(&resources, &buyer).unwrap())
        .json(&json!({ "rating": 5, "title": "Great", "comment": "Works well" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(verified["is_verified_purchase"], true);

    AxumTestRequest::post(&uri)
        .auth(&common::bearer(&resources, &buyer).unwrap())
        .json(&json!({ "rating": 4 }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let unverified: Value = AxumTestRequest::post(&uri)
        .auth(&common::bearer(&resources, &browser).unwrap())
        .json(&json!({ "rating": 3 }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(unverified["is_verified_purchase"], false);

    let detail: Value = AxumTestRequest::get(&format!("/api/marketplace/products/{}", product.id))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(detail["review_count"], 2);
    assert_eq!(detail["average_rating"], 4.0);
    assert_eq!(detail["recent_reviews"].as_array().unwrap().len(), 2);
}
