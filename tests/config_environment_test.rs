// ABOUTME: Tests for environment-driven server configuration
// ABOUTME: Runs serially because each case rewrites process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use serial_test::serial;
use startup_marketplace::{
    config::{Environment, ServerConfig},
    errors::ErrorCode,
};
use std::env;

const VARS: [&str; 8] = [
    "ENVIRONMENT",
    "HOST",
    "HTTP_PORT",
    "DATABASE_URL",
    "JWT_SECRET",
    "JWT_ACCESS_TOKEN_LIFETIME_MINUTES",
    "BCRYPT_COST",
    "CORS_ALLOWED_ORIGINS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.http_port, 8000);
    assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
    assert!(config.auth.jwt_secret_generated);
    assert_eq!(config.cors.allowed_origins, "*");
}

#[test]
#[serial]
fn test_values_read_from_environment() {
    clear_env();
    env::set_var("ENVIRONMENT", "testing");
    env::set_var("HTTP_PORT", "9100");
    env::set_var("DATABASE_URL", "sqlite::memory:");
    env::set_var("JWT_SECRET", "configured-secret");
    env::set_var("BCRYPT_COST", "6");
    env::set_var("CORS_ALLOWED_ORIGINS", "https://campus.example");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.environment, Environment::Testing);
    assert_eq!(config.http_port, 9100);
    assert_eq!(config.auth.jwt_secret, b"configured-secret");
    assert!(!config.auth.jwt_secret_generated);
    assert_eq!(config.auth.bcrypt_cost, 6);
    assert_eq!(config.database_file_path(), None);
    assert_eq!(config.cors.allowed_origins, "https://campus.example");

    clear_env();
}

#[test]
#[serial]
fn test_production_requires_jwt_secret() {
    clear_env();
    env::set_var("ENVIRONMENT", "production");

    let err = ServerConfig::from_env().unwrap_err();
    assert_eq!(err.code, ErrorCode::ConfigError);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_numbers_rejected() {
    clear_env();
    env::set_var("HTTP_PORT", "eighty");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("BCRYPT_COST", "2");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("JWT_ACCESS_TOKEN_LIFETIME_MINUTES", "0");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
}
