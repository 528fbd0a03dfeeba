//! # Repository Module
//!
//! Database repository implementations for the consignment store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  db.items().save(&item)                                        │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── save(&self, item)                                                 │
//! │  ├── get(&self, item_id)                                               │
//! │  └── load_all(&self)                                                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every save is an upsert that stamps modified_at = now and             │
//! │  sync_status = 'pending', so dirty tracking is a side effect of        │
//! │  writing and can never be forgotten by a caller.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`account::AccountRepository`] - Account rows
//! - [`item::ItemRepository`] - Item rows (+ their sale rows, atomically)
//! - [`payout::PayoutRepository`] - Payout rows
//! - [`config::ConfigRepository`] - Store configuration key/values
//! - [`sync::SyncRepository`] - Dirty tracking, bulk import, sync journal

pub mod account;
pub mod config;
pub mod item;
pub mod payout;
pub mod sync;
