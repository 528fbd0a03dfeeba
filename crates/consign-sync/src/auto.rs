//! # Auto Sync
//!
//! Interval gating for opportunistic pushes. The host application calls
//! [`AutoSync::sync_if_due`] from wherever is convenient (a timer tick,
//! after closing a sale, on idle) and the gate decides whether enough
//! time has passed to bother the network.
//!
//! Only a successful push (including NoChanges) advances the clock:
//! after a failure the next call retries immediately.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::engine::CloudSync;
use crate::error::SyncResult;
use crate::remote::RemoteStore;
use crate::report::SyncReport;

/// Default minutes between automatic pushes.
pub const DEFAULT_INTERVAL_MINUTES: i64 = 15;

/// Interval-gated wrapper around [`CloudSync`].
#[derive(Debug, Clone)]
pub struct AutoSync<R: RemoteStore> {
    engine: CloudSync<R>,
    interval: Duration,
    last_sync: Option<DateTime<Utc>>,
}

impl<R: RemoteStore> AutoSync<R> {
    /// Wraps an engine with the default 15-minute interval.
    pub fn new(engine: CloudSync<R>) -> Self {
        Self::with_interval_minutes(engine, DEFAULT_INTERVAL_MINUTES)
    }

    /// Wraps an engine with a custom interval.
    pub fn with_interval_minutes(engine: CloudSync<R>, minutes: i64) -> Self {
        AutoSync {
            engine,
            interval: Duration::minutes(minutes),
            last_sync: None,
        }
    }

    /// The wrapped engine, for direct pushes and pulls.
    pub fn engine(&self) -> &CloudSync<R> {
        &self.engine
    }

    /// When the last successful automatic push completed.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// Whether a push is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_sync {
            None => true,
            Some(last) => now - last >= self.interval,
        }
    }

    /// Pushes if the interval has elapsed; otherwise does nothing and
    /// returns `None`.
    pub async fn sync_if_due(&mut self) -> SyncResult<Option<SyncReport>> {
        let now = Utc::now();
        if !self.is_due(now) {
            debug!("Auto sync not due yet");
            return Ok(None);
        }

        let report = self.engine.push_changes().await?;
        if report.is_success() {
            self.last_sync = Some(Utc::now());
        }
        Ok(Some(report))
    }

    /// Pushes immediately, ignoring the interval.
    pub async fn force_sync(&mut self) -> SyncResult<SyncReport> {
        let report = self.engine.push_changes().await?;
        if report.is_success() {
            self.last_sync = Some(Utc::now());
        }
        Ok(report)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use consign_db::{Database, DbConfig};

    use crate::report::SyncStatus;
    use crate::testing::MemoryRemote;

    use super::*;

    async fn auto_sync(remote: MemoryRemote) -> AutoSync<MemoryRemote> {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AutoSync::new(CloudSync::new(db, remote))
    }

    #[tokio::test]
    async fn test_first_sync_is_always_due() {
        let mut auto = auto_sync(MemoryRemote::new()).await;
        assert!(auto.is_due(Utc::now()));

        let report = auto.sync_if_due().await.unwrap().unwrap();
        assert_eq!(report.status, SyncStatus::NoChanges);
        assert!(auto.last_sync().is_some());
    }

    #[tokio::test]
    async fn test_second_sync_within_interval_is_skipped() {
        let mut auto = auto_sync(MemoryRemote::new()).await;
        auto.sync_if_due().await.unwrap();

        assert!(auto.sync_if_due().await.unwrap().is_none());

        // Due again once the interval has elapsed.
        let later = Utc::now() + Duration::minutes(16);
        assert!(auto.is_due(later));
    }

    #[tokio::test]
    async fn test_failure_does_not_advance_the_clock() {
        let mut auto = auto_sync(MemoryRemote::unconfigured()).await;

        let report = auto.sync_if_due().await.unwrap().unwrap();
        assert_eq!(report.status, SyncStatus::Failed);
        assert!(auto.last_sync().is_none());

        // Immediately due again.
        assert!(auto.sync_if_due().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_force_sync_ignores_interval() {
        let mut auto = auto_sync(MemoryRemote::new()).await;
        auto.sync_if_due().await.unwrap();

        let report = auto.force_sync().await.unwrap();
        assert_eq!(report.status, SyncStatus::NoChanges);
    }
}
