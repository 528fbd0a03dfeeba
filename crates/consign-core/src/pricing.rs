//! # Pricing Rules
//!
//! Pure functions for the age-based markdown schedule and the sale split.
//!
//! ## The Markdown Schedule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │   Age (days)      0..=29    30..=59    60..=89    90..=119   120+   │
//! │   Discount          0%        25%        50%        75%    expired  │
//! │                                                                     │
//! │   At 120 days the item becomes store property (EXPIRY_DAYS).        │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Split
//! ```text
//! sale_price ──► net = sale_price - stocking_fee
//!                account_share = round_half_up(net * split)
//!                store_share   = sale_price - account_share
//!
//! If the fee exceeds the sale price (net < 0) the account share clamps
//! to zero and the store absorbs the shortfall.
//! ```
//!
//! Every rounding point here is round-half-up. Never banker's rounding:
//! the totals must agree bit-exactly with the physical register.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::{Money, SplitPercent};

/// Markdown schedule as (days threshold, discount percent) pairs.
/// The first threshold satisfied (highest threshold <= elapsed days) wins.
pub const DISCOUNT_SCHEDULE: [(i64, u8); 4] = [(90, 75), (60, 50), (30, 25), (0, 0)];

/// Items become store property once this many days have elapsed.
pub const EXPIRY_DAYS: i64 = 120;

/// Whole days elapsed between entry and the as-of date.
///
/// Negative inputs (as-of before entry) are a caller error; the schedule
/// is only defined for elapsed days >= 0.
#[inline]
pub fn days_since(entry_date: NaiveDate, as_of: NaiveDate) -> i64 {
    (as_of - entry_date).num_days()
}

/// Current discount percent for an item entered on `entry_date`.
pub fn discount_percent(entry_date: NaiveDate, as_of: NaiveDate) -> u8 {
    let days = days_since(entry_date, as_of);
    for (threshold, discount) in DISCOUNT_SCHEDULE {
        if days >= threshold {
            return discount;
        }
    }
    0
}

/// Current price after the age-based markdown, rounded half-up to cents.
pub fn current_price(original_price: Money, entry_date: NaiveDate, as_of: NaiveDate) -> Money {
    let discount = discount_percent(entry_date, as_of);
    // original * (100 - d) / 100, half-up. Prices are non-negative so the
    // +50 offset is exactly round-half-up.
    let cents = (original_price.cents() * (100 - discount as i64) + 50) / 100;
    Money::from_cents(cents)
}

/// Whether the item has passed the 120-day expiry threshold.
#[inline]
pub fn is_expired(entry_date: NaiveDate, as_of: NaiveDate) -> bool {
    days_since(entry_date, as_of) >= EXPIRY_DAYS
}

// =============================================================================
// Sale Split
// =============================================================================

/// The two sides of a sale's proceeds. Always sums to the sale price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSplit {
    /// The owning account's share (never negative).
    pub account_share: Money,
    /// The store's share (fee plus its cut; absorbs any shortfall).
    pub store_share: Money,
}

/// Computes the account/store split for a sale.
///
/// `net = sale_price - stocking_fee`; the account gets `net * split`
/// rounded half-up to cents, the store gets the remainder. When the fee
/// exceeds the sale price the account share clamps to zero rather than
/// charging the account negative proceeds.
pub fn compute_split(sale_price: Money, stocking_fee: Money, split: SplitPercent) -> SaleSplit {
    let net = sale_price - stocking_fee;

    let account_share = if net.is_negative() {
        Money::zero()
    } else {
        // net * bps / 10000, half-up via the +5000 offset (net >= 0 here)
        let cents = (net.cents() as i128 * split.bps() as i128 + 5_000) / 10_000;
        Money::from_cents(cents as i64)
    };

    SaleSplit {
        account_share,
        store_share: sale_price - account_share,
    }
}

// =============================================================================
// Price Tier
// =============================================================================

/// Human-readable pricing tier for an item's current age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceTier {
    FullPrice,
    PercentOff(u8),
    Expired,
}

/// Pricing tier for an item entered on `entry_date`, as of `as_of`.
pub fn price_tier(entry_date: NaiveDate, as_of: NaiveDate) -> PriceTier {
    if is_expired(entry_date, as_of) {
        PriceTier::Expired
    } else {
        match discount_percent(entry_date, as_of) {
            0 => PriceTier::FullPrice,
            d => PriceTier::PercentOff(d),
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceTier::FullPrice => write!(f, "Full Price"),
            PriceTier::PercentOff(d) => write!(f, "{}% Off", d),
            PriceTier::Expired => write!(f, "Expired - Store Property"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
