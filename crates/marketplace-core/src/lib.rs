// ABOUTME: Core types and constants for the startup marketplace platform
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

#![deny(unsafe_code)]

//! # Marketplace Core
//!
//! Foundation crate providing shared types and constants for the startup
//! marketplace server. This crate changes infrequently, which keeps the
//! workspace's incremental builds cheap.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: Application-wide constants organized by domain
//! - **models**: Domain enumerations and value types (roles, statuses, money)

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core domain models (roles, product/order status, FAQ categories, money)
pub mod models;
