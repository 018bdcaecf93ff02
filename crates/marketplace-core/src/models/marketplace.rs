// ABOUTME: Product and order status enumerations plus the structured shipping address
// ABOUTME: Encodes the order status graph and shipping address field validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Listing status of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    /// Not yet published
    #[default]
    Draft,
    /// Visible and purchasable
    Active,
    /// Hidden by the owner
    Inactive,
    /// Marked as sold out
    OutOfStock,
}

impl ProductStatus {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
            Self::OutOfStock => "OUT_OF_STOCK",
        }
    }

    /// A product can be ordered only when active and in stock
    #[must_use]
    pub const fn is_available(self, inventory_count: i64) -> bool {
        matches!(self, Self::Active) && inventory_count > 0
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(Self::Draft),
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            "OUT_OF_STOCK" => Ok(Self::OutOfStock),
            other => Err(AppError::invalid_input(format!("Unknown product status: {other}"))),
        }
    }
}

/// Lifecycle status of an order
///
/// The main line is `Pending -> Confirmed -> Shipped -> Delivered`. `Cancelled` is
/// reachable from `Pending` and `Confirmed`; `Refunded` only from `Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Placed, awaiting confirmation
    #[default]
    Pending,
    /// Accepted by the seller
    Confirmed,
    /// Handed to the carrier
    Shipped,
    /// Received by the buyer
    Delivered,
    /// Cancelled before shipping
    Cancelled,
    /// Refunded after delivery
    Refunded,
}

impl OrderStatus {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        }
    }

    /// Only orders that have not shipped can be cancelled
    #[must_use]
    pub const fn is_cancellable(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether `next` is a legal successor of this status
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
                | (Self::Delivered, Self::Refunded)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "CONFIRMED" => Ok(Self::Confirmed),
            "SHIPPED" => Ok(Self::Shipped),
            "DELIVERED" => Ok(Self::Delivered),
            "CANCELLED" => Ok(Self::Cancelled),
            "REFUNDED" => Ok(Self::Refunded),
            other => Err(AppError::invalid_input(format!("Unknown order status: {other}"))),
        }
    }
}

/// Structured shipping address stored as JSON on the order
///
/// Absent fields deserialize as empty strings so that validation can name the
/// missing field instead of failing at the JSON layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Street and number
    #[serde(default)]
    pub street: String,
    /// City
    #[serde(default)]
    pub city: String,
    /// State or region
    #[serde(default)]
    pub state: String,
    /// Postal code
    #[serde(default)]
    pub postal_code: String,
    /// Country
    #[serde(default)]
    pub country: String,
}

impl ShippingAddress {
    /// Field names in the order they are checked
    pub const REQUIRED_FIELDS: [&'static str; 5] =
        ["street", "city", "state", "postal_code", "country"];

    fn field(&self, name: &str) -> &str {
        match name {
            "street" => &self.street,
            "city" => &self.city,
            "state" => &self.state,
            "postal_code" => &self.postal_code,
            _ => &self.country,
        }
    }

    /// Require every address field to be non-blank
    ///
    /// # Errors
    ///
    /// Returns a `MissingRequiredField` error naming the first blank field
    pub fn validate(&self) -> AppResult<()> {
        for name in Self::REQUIRED_FIELDS {
            if self.field(name).trim().is_empty() {
                return Err(AppError::missing_field(
                    name,
                    format!("Shipping address must contain {name}."),
                ));
            }
        }
        Ok(())
    }
}
