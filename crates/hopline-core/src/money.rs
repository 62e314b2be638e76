//! # Money Module
//!
//! Provides the `Money` type for wholesale prices and totals.
//!
//! ## Whole Currency Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PRICES ARE WHOLE RUPEES                                                │
//! │                                                                         │
//! │  Distributor price lists carry no minor units:                          │
//! │    Tuborg Beer 650ml ......... 420                                      │
//! │    3 × 420 ................... 1260   (exact, integer math)            │
//! │                                                                         │
//! │  Display adds the currency prefix and thousands grouping:               │
//! │    1260  → "Rs. 1,260"                                                  │
//! │    -500  → "-Rs. 500"                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use hopline_core::money::Money;
//!
//! let price = Money::from_units(420);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.units(), 1260);
//! assert_eq!(line.to_string(), "Rs. 1,260");
//! ```
//!
//! Arithmetic saturates at the `i64` bounds instead of wrapping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

/// Currency prefix used by [`Money`]'s `Display` implementation.
pub const CURRENCY_PREFIX: &str = "Rs.";

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole currency units.
///
/// ## Where Money is Used
/// ```text
/// Product.price ──┬──► CartLine (snapshot) ──► OrderItem.price ──► Order.total
///                 │
///                 └──► POS customPrice override ──► CounterSale.total
/// ```
///
/// A newtype struct, so serde writes it as a bare integer and persisted
/// blobs keep the `price: 420` shape.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Khukri Rum 1500
    /// Quantity: 2
    ///      │
    ///      ▼
    /// multiply_quantity(2) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line subtotal: 3000
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Formats as `Rs. 12,345` with comma grouping.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{sign}{CURRENCY_PREFIX} {grouped}")
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
