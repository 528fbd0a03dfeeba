//! # Sync Error Types
//!
//! Error types for cloud synchronization.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  Postgres Error / DbError / bad config                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SyncError (this module)                                               │
//! │       │                                                                 │
//! │       ├── Protocol errors → recorded on the SyncReport and in the      │
//! │       │                     sync_log journal (push keeps rows pending) │
//! │       │                                                                 │
//! │       └── Local DB errors → propagated to the caller                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use consign_db::DbError;

/// Cloud synchronization errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No cloud credentials are configured.
    ///
    /// ## When This Occurs
    /// - Environment variables not set
    /// - Running a store that has never been linked to the cloud
    #[error("Cloud sync is not configured")]
    NotConfigured,

    /// A connection URL could not be parsed.
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    /// The remote Postgres operation failed.
    ///
    /// ## When This Occurs
    /// - Network unreachable
    /// - Authentication failure
    /// - Constraint violation on the cloud schema
    #[error("Remote error: {0}")]
    Remote(String),

    /// The local database failed mid-sync.
    #[error("Local database error: {0}")]
    Database(#[from] DbError),
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        SyncError::Remote(err.to_string())
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
