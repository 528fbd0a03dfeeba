//! # consign-core: Pure Business Logic for the Consignment Store
//!
//! This crate is the **heart** of the system. It contains all business
//! logic as pure functions and in-memory state with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Consignment Store Architecture                      │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ consign-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │   store   │  │   │
//! │  │   │  Account  │  │   Money   │  │ discounts │  │ lifecycle │  │   │
//! │  │   │   Item    │  │  Split%   │  │  splits   │  │ payouts   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   consign-db (Database Layer)                   │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  consign-sync (Cloud Sync)                      │   │
//! │  │          push/pull engine against a central Postgres            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Account, Item, SaleRecord, Payout)
//! - [`money`] - Money and split-percent types with integer arithmetic (no floating point!)
//! - [`pricing`] - Time-based discount schedule and sale split arithmetic
//! - [`store`] - ConsignmentStore aggregate and lifecycle state machine
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every calculation is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use consign_core::money::{Money, SplitPercent};
//! use consign_core::pricing::compute_split;
//!
//! // Create money from cents (never from floats!)
//! let sale_price = Money::from_cents(10000); // $100.00
//!
//! // Split after a $2.00 stocking fee at a 60% account share
//! let split = compute_split(sale_price, Money::from_cents(200), SplitPercent::from_percent(60));
//!
//! // Account gets $58.80, store keeps $41.20
//! assert_eq!(split.account_share.cents(), 5880);
//! assert_eq!(split.store_share.cents(), 4120);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use consign_core::Money` instead of
// `use consign_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, SplitPercent};
pub use pricing::{PriceTier, SaleSplit, DISCOUNT_SCHEDULE, EXPIRY_DAYS};
pub use store::{
    ConsignmentStore, InventorySummary, NewAccount, NewItem, DEFAULT_ACCOUNT_TYPE, DEFAULT_SPLIT,
    DEFAULT_STOCKING_FEE,
};
pub use types::*;
