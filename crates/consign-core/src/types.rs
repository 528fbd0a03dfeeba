//! # Domain Types
//!
//! Core domain types for the consignment system.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │    Account     │   │      Item      │   │   SaleRecord   │      │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │      │
//! │  │  id (A####)    │◄──│  account_id    │   │  item_id       │      │
//! │  │  split terms   │   │  id (I######)  │──►│  sale split    │      │
//! │  │  balance       │   │  status        │   │  (immutable)   │      │
//! │  └────────────────┘   └────────────────┘   └────────────────┘      │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐                           │
//! │  │     Payout     │   │   ItemStatus   │                           │
//! │  │  ────────────  │   │  ────────────  │                           │
//! │  │  id (P######)  │   │  Active        │                           │
//! │  │  amount        │   │  Sold/Returned │                           │
//! │  │  check number  │   │  Expired       │                           │
//! │  └────────────────┘   └────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Identity is a sequential business key per entity kind (`A1001`,
//! `I000001`, `P000001`), issued by the `ConsignmentStore` aggregate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::money::{Money, SplitPercent};
use crate::pricing::{self, PriceTier};

// =============================================================================
// Address
// =============================================================================

/// Mailing address for an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {} {}",
            self.street, self.city, self.state, self.zip_code
        )
    }
}

// =============================================================================
// Item Status
// =============================================================================

/// Lifecycle status of a consignment item.
///
/// Transitions are monotonic: an item leaves `Active` exactly once and
/// the three terminal states reject every further transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// On the floor, available for sale.
    Active,
    /// Sold; a `SaleRecord` is attached.
    Sold,
    /// Picked up by / returned to the account.
    Returned,
    /// Store property after 120 days.
    Expired,
}

impl ItemStatus {
    /// Canonical lowercase form used in the database and on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Sold => "sold",
            ItemStatus::Returned => "returned",
            ItemStatus::Expired => "expired",
        }
    }

    /// All statuses, for summary iteration.
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Active,
        ItemStatus::Sold,
        ItemStatus::Returned,
        ItemStatus::Expired,
    ];
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ItemStatus::Active),
            "sold" => Ok(ItemStatus::Sold),
            "returned" => Ok(ItemStatus::Returned),
            "expired" => Ok(ItemStatus::Expired),
            other => Err(format!("unknown item status: '{}'", other)),
        }
    }
}

// =============================================================================
// Sale Record
// =============================================================================

/// Record of a completed sale transaction. Immutable once created.
///
/// Invariant: `account_share + store_share == sale_price` exactly, and
/// `account_share >= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRecord {
    pub item_id: String,
    pub sale_date: NaiveDate,
    pub original_price: Money,
    pub sale_price: Money,
    pub discount_percent: u8,
    pub stocking_fee: Money,
    pub account_share: Money,
    pub store_share: Money,
}

// =============================================================================
// Payout
// =============================================================================

/// Record of a payout to an account, draining its balance at the time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub payout_id: String,
    pub account_id: String,
    pub payout_date: NaiveDate,
    pub amount: Money,
    pub check_number: Option<String>,
}

// =============================================================================
// Item
// =============================================================================

/// A consignment item moving through the automatic markdown schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    pub account_id: String,
    pub name: String,
    pub description: String,
    pub original_price: Money,
    pub entry_date: NaiveDate,
    pub status: ItemStatus,
    /// Date the status last changed (entry date while Active).
    pub status_date: NaiveDate,
    /// Present exactly when `status == Sold`.
    pub sale_record: Option<SaleRecord>,
}

impl Item {
    /// Whole days since the item entered the store.
    pub fn days_since_entry(&self, as_of: NaiveDate) -> i64 {
        pricing::days_since(self.entry_date, as_of)
    }

    /// Current discount percent based on age.
    pub fn discount_percent(&self, as_of: NaiveDate) -> u8 {
        pricing::discount_percent(self.entry_date, as_of)
    }

    /// Current price after the time-based markdown.
    pub fn current_price(&self, as_of: NaiveDate) -> Money {
        pricing::current_price(self.original_price, self.entry_date, as_of)
    }

    /// Whether the item has passed the 120-day expiry threshold.
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        pricing::is_expired(self.entry_date, as_of)
    }

    /// Human-readable description of the current pricing tier.
    pub fn price_tier(&self, as_of: NaiveDate) -> PriceTier {
        pricing::price_tier(self.entry_date, as_of)
    }
}

// =============================================================================
// Account
// =============================================================================

/// An account (client) who provides items for sale.
///
/// `balance` accrues the account share of each sale and drains to zero on
/// payout; it never goes negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub first_name: String,
    pub last_name: String,
    pub address: Address,
    /// Type of account: "consignment", etc.
    pub account_type: String,
    /// Account's percentage of the sale after the stocking fee.
    pub split_percent: SplitPercent,
    /// Flat fee per item sold, retained by the store.
    pub stocking_fee: Money,
    pub balance: Money,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_date: NaiveDate,
}

impl Account {
    /// Formatted name as "Last, First".
    pub fn full_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
