//! # consign-db: Database Layer for the Consignment Store
//!
//! This crate provides database access for the consignment store system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Consignment Store Data Flow                           │
//! │                                                                         │
//! │  Caller (app / sync engine)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    consign-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (account.rs,  │    │  (embedded)  │  │   │
//! │  │   │               │    │  item.rs, ...)│    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ dirty-stamped │    │ 001_init.sql │  │   │
//! │  │   │ load_store    │    │ upserts       │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL mode)                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, config, and whole-store load/save
//! - [`migrations`] - Embedded database migrations
//! - [`rows`] - Typed row structs mirroring the schema
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (account, item, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use consign_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/consign.db")).await?;
//!
//! let mut store = db.load_store().await?;
//! let sale = store.sell_item("I000042", None)?;
//! db.items().save(store.get_item("I000042").unwrap()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod rows;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use rows::{ChangeSet, SYNC_PENDING, SYNC_SYNCED};

// Repository re-exports for convenience
pub use repository::account::AccountRepository;
pub use repository::config::ConfigRepository;
pub use repository::item::ItemRepository;
pub use repository::payout::PayoutRepository;
pub use repository::sync::SyncRepository;
