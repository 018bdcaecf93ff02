// ABOUTME: Configuration module for server settings loaded from the environment
// ABOUTME: Re-exports the environment-driven ServerConfig and its sections
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Configuration for the marketplace server
//!
//! All settings come from environment variables; the server binary can
//! override a few of them from the command line.

/// Environment and server configuration
pub mod environment;

pub use environment::{AuthConfig, CorsConfig, Environment, ServerConfig};
