//! # Sync Reports
//!
//! The outcome type every sync operation returns. Protocol failures are
//! data here, not `Err`: a failed push is an expected condition for an
//! offline store, and the caller decides whether to surface it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way data moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Local changes uploaded to the cloud.
    Push,
    /// Cloud state downloaded, replacing local data.
    Pull,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::Push => write!(f, "push"),
            SyncDirection::Pull => write!(f, "pull"),
        }
    }
}

/// Outcome of a sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Records moved and were committed on both sides.
    Success,
    /// The attempt failed; no local sync state was changed.
    Failed,
    /// Nothing was dirty; no work to do. Not an error.
    NoChanges,
}

/// The result of one sync operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub direction: SyncDirection,
    pub status: SyncStatus,
    pub records_synced: u64,
    pub error: Option<String>,
}

impl SyncReport {
    /// A completed sync that moved `records` rows.
    pub fn success(direction: SyncDirection, records: u64) -> Self {
        SyncReport {
            direction,
            status: SyncStatus::Success,
            records_synced: records,
            error: None,
        }
    }

    /// Nothing was pending.
    pub fn no_changes(direction: SyncDirection) -> Self {
        SyncReport {
            direction,
            status: SyncStatus::NoChanges,
            records_synced: 0,
            error: None,
        }
    }

    /// A failed attempt with the reason.
    pub fn failure(direction: SyncDirection, error: impl Into<String>) -> Self {
        SyncReport {
            direction,
            status: SyncStatus::Failed,
            records_synced: 0,
            error: Some(error.into()),
        }
    }

    /// True for Success and NoChanges (the store is in sync).
    pub fn is_success(&self) -> bool {
        matches!(self.status, SyncStatus::Success | SyncStatus::NoChanges)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            SyncStatus::Success => {
                write!(f, "{}: {} records synced", self.direction, self.records_synced)
            }
            SyncStatus::NoChanges => write!(f, "{}: no changes", self.direction),
            SyncStatus::Failed => write!(
                f,
                "{} failed: {}",
                self.direction,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_and_no_changes_are_both_success() {
        assert!(SyncReport::success(SyncDirection::Push, 5).is_success());
        assert!(SyncReport::no_changes(SyncDirection::Push).is_success());
        assert!(!SyncReport::failure(SyncDirection::Pull, "boom").is_success());
    }

    #[test]
    fn test_display() {
        let report = SyncReport::success(SyncDirection::Push, 3);
        assert_eq!(report.to_string(), "push: 3 records synced");

        let report = SyncReport::failure(SyncDirection::Pull, "connection refused");
        assert_eq!(report.to_string(), "pull failed: connection refused");
    }
}
