//! # consign-sync: Cloud Sync Engine for the Consignment Store
//!
//! Synchronizes the local SQLite database with a central Postgres cloud
//! database. The store is offline-first: every operation works without
//! the cloud, and sync moves accumulated changes when connectivity
//! allows.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Consignment Store Sync Layer                         │
//! │                                                                         │
//! │  Local writes (consign-db repositories)                                │
//! │       │  every save stamps sync_status = 'pending'                     │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   consign-sync (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  AutoSync ──► CloudSync ──► RemoteStore (trait)                │   │
//! │  │  (interval    (push/pull     │                                 │   │
//! │  │   gating)      protocol)     └──► PgRemote (Postgres)          │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Central Postgres (shared by all stores, last-write-wins)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`engine`] - CloudSync push/pull orchestration and journaling
//! - [`remote`] - RemoteStore trait and the Postgres implementation
//! - [`auto`] - Interval-gated automatic pushes
//! - [`config`] - Cloud connection configuration
//! - [`report`] - SyncReport outcome type
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use consign_db::{Database, DbConfig};
//! use consign_sync::{CloudSync, PgRemote};
//!
//! let db = Database::new(DbConfig::new("consign.db")).await?;
//! let engine = CloudSync::new(db, PgRemote::from_env());
//!
//! let report = engine.push_changes().await?;
//! println!("{}", report);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auto;
pub mod config;
pub mod engine;
pub mod error;
pub mod remote;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use auto::{AutoSync, DEFAULT_INTERVAL_MINUTES};
pub use config::CloudConfig;
pub use engine::{derive_instance_id, CloudSync};
pub use error::{SyncError, SyncResult};
pub use remote::{PgRemote, RemoteStore};
pub use report::{SyncDirection, SyncReport, SyncStatus};
