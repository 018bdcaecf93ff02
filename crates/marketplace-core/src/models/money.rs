// ABOUTME: Conversions between decimal prices and integer cents
// ABOUTME: All stored amounts are cents; arithmetic is exact and overflow-checked
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use crate::errors::{AppError, AppResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Convert stored cents to a two-place decimal
#[must_use]
pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Convert a decimal amount to cents
///
/// Amounts with more than two decimal places are rejected rather than rounded.
///
/// # Errors
///
/// Returns `InvalidFormat` for sub-cent precision and `ValueOutOfRange` when the
/// amount does not fit in an `i64` number of cents
pub fn decimal_to_cents(amount: Decimal) -> AppResult<i64> {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::ToZero);
    if rounded != amount {
        return Err(AppError::invalid_format(
            "Amounts may have at most 2 decimal places",
        ));
    }
    rounded
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| AppError::out_of_range("Amount is too large"))
}

/// Line total in cents for a unit price and quantity
///
/// # Errors
///
/// Returns `ValueOutOfRange` on overflow
pub fn line_total_cents(unit_price_cents: i64, quantity: i64) -> AppResult<i64> {
    unit_price_cents
        .checked_mul(quantity)
        .ok_or_else(|| AppError::out_of_range("Line total overflows"))
}
