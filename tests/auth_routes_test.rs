// ABOUTME: Integration tests for registration, login, token refresh, and account routes
// ABOUTME: Exercises the JWT flow end to end against an in-memory database
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
use startup_marketplace::{models::UserRole, routes::build_router};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Log sink shared between a test and a thread-local subscriber
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn registration(email: &str, role: &str) -> Value {
    json!({
        "email": email,
        "username": "ada",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "role": role,
        "password": common::TEST_PASSWORD,
        "password_confirm": common::TEST_PASSWORD,
    })
}

#[tokio::test]
async fn test_register_login_and_me() {
    let resources = common::create_test_server_resources().await.unwrap();

    let registered: Value = AxumTestRequest::post("/api/auth/register")
        .json(&registration("Ada@Example.com", "STARTUP"))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(registered["email"], "ada@example.com");

    let login: Value = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "ada@example.com", "password": common::TEST_PASSWORD }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(login["user"]["role"], "STARTUP");
    assert_eq!(login["user"]["full_name"], "Ada Lovelace");
    assert_eq!(login["user"]["is_verified"], false);

    let access = login["access"].as_str().unwrap();
    let me: Value = AxumTestRequest::get("/api/users/me")
        .auth(&format!("Bearer {access}"))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(me["id"], registered["user_id"]);
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let resources = common::create_test_server_resources().await.unwrap();

    let admin = AxumTestRequest::post("/api/auth/register")
        .json(&registration("root@example.com", "ADMIN"))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(admin.error_code(), "INVALID_INPUT");

    let mut mismatch = registration("mismatch@example.com", "STUDENT");
    mismatch["password_confirm"] = json!("Other1!pass");
    let response = AxumTestRequest::post("/api/auth/register")
        .json(&mismatch)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Password fields didn't match.");

    let mut weak = registration("weak@example.com", "STUDENT");
    weak["password"] = json!("password");
    weak["password_confirm"] = json!("password");
    AxumTestRequest::post("/api/auth/register")
        .json(&weak)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/auth/register")
        .json(&registration("not-an-email", "STUDENT"))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let resources = common::create_test_server_resources().await.unwrap();

    AxumTestRequest::post("/api/auth/register")
        .json(&registration("dup@example.com", "STUDENT"))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::CREATED);

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&registration("dup@example.com", "MENTOR"))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::CONFLICT);
    assert_eq!(response.error_code(), "RESOURCE_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_login_rejects_wrong_password_and_disabled_account() {
    let resources = common::create_test_server_resources().await.unwrap();
    let user = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();

    let wrong = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": user.email, "password": "Wrong1!pass" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.error_code(), "AUTH_INVALID");

    resources
        .database
        .set_user_active(&user.id, false)
        .await
        .unwrap();
    AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": user.email, "password": common::TEST_PASSWORD }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let token = common::bearer(&resources, &user).unwrap();
    AxumTestRequest::get("/api/users/me")
        .auth(&token)
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_issues_access_token() {
    let resources = common::create_test_server_resources().await.unwrap();
    let user = common::create_test_user(&resources, UserRole::Mentor)
        .await
        .unwrap();
    let pair = resources.auth_manager.generate_token_pair(&user).unwrap();

    let body: Value = AxumTestRequest::post("/api/auth/refresh")
        .json(&json!({ "refresh": pair.refresh }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    let access = body["access"].as_str().unwrap();

    AxumTestRequest::get("/api/users/me")
        .auth(&format!("Bearer {access}"))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK);

    // access tokens are not accepted as refresh tokens
    AxumTestRequest::post("/api/auth/refresh")
        .json(&json!({ "refresh": pair.access }))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_token_requires_auth() {
    let resources = common::create_test_server_resources().await.unwrap();

    let response = AxumTestRequest::get("/api/users/me")
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_verify_email_token_is_single_use() {
    let resources = common::create_test_server_resources().await.unwrap();
    let user = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let token = resources
        .database
        .create_verification_token(&user.id)
        .await
        .unwrap();
    assert_eq!(token.len(), 64);

    AxumTestRequest::get(&format!("/api/auth/verify-email?token={token}"))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK);

    let verified = resources.database.get_user(&user.id).await.unwrap().unwrap();
    assert!(verified.is_verified);

    AxumTestRequest::get(&format!("/api/auth/verify-email?token={token}"))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::get("/api/auth/verify-email")
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_password_and_profile_update() {
    let resources = common::create_test_server_resources().await.unwrap();
    let user = common::create_test_user(&resources, UserRole::Student)
        .await
        .unwrap();
    let token = common::bearer(&resources, &user).unwrap();

    AxumTestRequest::post("/api/users/me/change-password")
        .auth(&token)
        .json(&json!({
            "old_password": "Wrong1!pass",
            "new_password": "N3w!Password",
            "new_password_confirm": "N3w!Password",
        }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/users/me/change-password")
        .auth(&token)
        .json(&json!({
            "old_password": common::TEST_PASSWORD,
            "new_password": "N3w!Password",
            "new_password_confirm": "N3w!Password",
        }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK);

    AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": user.email, "password": "N3w!Password" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK);

    let profile: Value = AxumTestRequest::put("/api/users/me/profile")
        .auth(&token)
        .json(&json!({ "bio": "Building things", "location": "Lisbon" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(profile["bio"], "Building things");
    assert_eq!(profile["location"], "Lisbon");

    let too_long = "x".repeat(501);
    AxumTestRequest::put("/api/users/me/profile")
        .auth(&token)
        .json(&json!({ "bio": too_long }))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_lists_users_and_profiles() {
    let resources = common::create_test_server_resources().await.unwrap();
    let admin = common::create_test_user(&resources, UserRole::Admin).await.unwrap();
    let student = common::create_test_user(&resources, UserRole::Student).await.unwrap();
    let admin_token = common::bearer(&resources, &admin).unwrap();
    let student_token = common::bearer(&resources, &student).unwrap();

    let users: Value = AxumTestRequest::get("/api/users")
        .auth(&admin_token)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(users.as_array().unwrap().len(), 2);
    assert!(users.as_array().unwrap().iter().all(|u| u["is_active"] == true));
    assert!(users[0].get("password_hash").is_none());

    let profiles: Value = AxumTestRequest::get("/api/profiles")
        .auth(&admin_token)
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(profiles.as_array().unwrap().len(), 2);

    for path in ["/api/users", "/api/profiles"] {
        let response = AxumTestRequest::get(path)
            .auth(&student_token)
            .send(build_router(resources.clone()))
            .await
            .assert_status(StatusCode::FORBIDDEN);
        assert_eq!(response.error_code(), "PERMISSION_DENIED");
    }
}

#[tokio::test]
async fn test_user_detail_visible_to_self_and_admin_only() {
    let resources = common::create_test_server_resources().await.unwrap();
    let admin = common::create_test_user(&resources, UserRole::Admin).await.unwrap();
    let student = common::create_test_user(&resources, UserRole::Student).await.unwrap();
    let other = common::create_test_user(&resources, UserRole::Mentor).await.unwrap();
    let path = format!("/api/users/{}", student.id);

    let own: Value = AxumTestRequest::get(&path)
        .auth(&common::bearer(&resources, &student).unwrap())
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(own["email"], student.email.as_str());

    AxumTestRequest::get(&path)
        .auth(&common::bearer(&resources, &admin).unwrap())
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK);

    AxumTestRequest::get(&path)
        .auth(&common::bearer(&resources, &other).unwrap())
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_disables_account_and_login_is_refused() {
    let resources = common::create_test_server_resources().await.unwrap();
    let admin = common::create_test_user(&resources, UserRole::Admin).await.unwrap();
    let student = common::create_test_user(&resources, UserRole::Student).await.unwrap();
    let admin_token = common::bearer(&resources, &admin).unwrap();
    let path = format!("/api/users/{}", student.id);

    let updated: Value = AxumTestRequest::put(&path)
        .auth(&admin_token)
        .json(&json!({ "is_active": false, "role": "mentor", "first_name": "Grace" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["is_active"], false);
    assert_eq!(updated["role"], "MENTOR");
    assert_eq!(updated["first_name"], "Grace");

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": student.email, "password": common::TEST_PASSWORD }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTH_INVALID");

    AxumTestRequest::put(&path)
        .auth(&common::bearer(&resources, &student).unwrap())
        .json(&json!({ "is_active": true }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    AxumTestRequest::put(&path)
        .auth(&admin_token)
        .json(&json!({ "is_active": true }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::OK);
    AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": student.email, "password": common::TEST_PASSWORD }))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_admin_update_rejects_bad_input() {
    let resources = common::create_test_server_resources().await.unwrap();
    let admin = common::create_test_user(&resources, UserRole::Admin).await.unwrap();
    let student = common::create_test_user(&resources, UserRole::Student).await.unwrap();
    let admin_token = common::bearer(&resources, &admin).unwrap();

    let response = AxumTestRequest::put(&format!("/api/users/{}", admin.id))
        .auth(&admin_token)
        .json(&json!({ "is_active": false }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "INVALID_INPUT");

    AxumTestRequest::put(&format!("/api/users/{}", student.id))
        .auth(&admin_token)
        .json(&json!({ "role": "wizard" }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::put("/api/users/no-such-user")
        .auth(&admin_token)
        .json(&json!({ "is_active": false }))
        .send(build_router(resources.clone()))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    AxumTestRequest::put(&format!("/api/users/{}", admin.id))
        .auth(&common::bearer(&resources, &student).unwrap())
        .json(&json!({ "role": "ADMIN" }))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_account_login_does_not_log_email() {
    let resources = common::create_test_server_resources().await.unwrap();
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let response = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "ghost.founder@example.com", "password": "whatever" }))
        .send(build_router(resources))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "AUTH_INVALID");

    let output = logs.contents();
    assert!(output.contains("login_unknown_email"));
    assert!(!output.contains("ghost.founder"));
}
