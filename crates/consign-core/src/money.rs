//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                         │
//! │                                                                     │
//! │  In floating point:                                                 │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                       │
//! │                                                                     │
//! │  A consignment split must agree cent-for-cent with the paper        │
//! │  register tape. A share that drifts by a cent is a dispute with     │
//! │  the account holder.                                                │
//! │                                                                     │
//! │  OUR SOLUTION: Integer Cents                                        │
//! │    $58.80 is 5880. All arithmetic is exact; every rounding point    │
//! │    is explicit and uses round-half-up.                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use consign_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(10000); // $100.00
//!
//! // Arithmetic operations
//! let fee = Money::from_cents(200);
//! let net = price - fee; // $98.00
//!
//! // NEVER do this:
//! // let bad = Money::from_float(99.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate values (net after fee) can go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support plus total ordering for comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use consign_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -$5.50, not -$4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }
}

// =============================================================================
// Split Percent
// =============================================================================

/// An account's share of post-fee proceeds, in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000. A 60% split is 6000 bps. Storing the
/// rate as an integer keeps the split arithmetic exact; the type does not
/// enforce the 0..=100% range (legacy data carries out-of-range terms,
/// which the arithmetic must still handle deterministically).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SplitPercent(u32);

impl SplitPercent {
    /// Creates a split rate from basis points (6000 = 60%).
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        SplitPercent(bps)
    }

    /// Creates a split rate from a whole percentage (60 = 60%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        SplitPercent(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero split (store keeps everything).
    #[inline]
    pub const fn zero() -> Self {
        SplitPercent(0)
    }
}

impl Default for SplitPercent {
    fn default() -> Self {
        SplitPercent::zero()
    }
}

impl fmt::Display for SplitPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// This is for logs and receipts-in-debugging. UI formatting (localization)
/// lives with the UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
