// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Holds the mentor chatbot and the order placement transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Domain service layer
//!
//! Route handlers authenticate and decode requests, then delegate here. The
//! services own validation and the multi-step workflows, so the same rules
//! apply to every caller, including tests that bypass HTTP entirely.

/// FAQ matching, canned replies, and chat-turn persistence
pub mod mentor;

/// Order placement, cancellation, and status transitions
pub mod orders;
