// ABOUTME: Core domain models shared by the server, database layer, and binaries
// ABOUTME: Re-exports role, status, FAQ category, shipping address, and money types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Domain Models
//!
//! Enumerations persisted as text columns expose `as_str()` and `FromStr` so the
//! database layer never stores ad-hoc strings. Role-driven behavior matches on
//! [`UserRole`] and [`SessionRole`] exhaustively.

mod chat;
mod marketplace;
mod money;
mod user;

pub use chat::{FaqCategory, Intent, ResponseType};
pub use marketplace::{OrderStatus, ProductStatus, ShippingAddress};
pub use money::{cents_to_decimal, decimal_to_cents, line_total_cents};
pub use user::{SessionRole, UserRole};
