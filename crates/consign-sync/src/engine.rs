//! # Cloud Sync Engine
//!
//! Orchestrates push and pull between the local database and a remote
//! store.
//!
//! ## Push Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         push_changes()                                  │
//! │                                                                         │
//! │  1. remote configured?          ── no ──► Failed report (no journal)   │
//! │  2. open journal entry (in_progress)                                   │
//! │  3. collect pending rows        ── none ─► close entry (success, 0)    │
//! │                                            and report NoChanges        │
//! │  4. ensure cloud schema                                                │
//! │  5. upsert rows + history in ONE remote transaction                    │
//! │  6. mark_all_synced locally     ← only after the remote commit         │
//! │  7. close journal entry (success / failed)                             │
//! │                                                                         │
//! │  A failure anywhere in 4-5 leaves every row pending, so the next       │
//! │  push retries the same change set. The remote upserts are              │
//! │  idempotent, so a crash between 5 and 6 re-sends rows harmlessly.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pull Protocol
//! Pull is a full restore: it deletes all local business data and
//! replaces it with the cloud dataset. Destructive, so the caller must
//! pass an explicit confirmation flag, which is checked before anything
//! else (even before configuration).
//!
//! ## Instance Identity
//! Each store is identified by a short stable hash of its hostname and
//! database path. The cloud tags every row with the last instance that
//! wrote it.

use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, warn};

use consign_db::repository::sync::{SyncRepository, LOG_FAILED, LOG_SUCCESS};
use consign_db::Database;

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;
use crate::report::{SyncDirection, SyncReport};

/// Journal sync_type values.
const TYPE_PUSH: &str = "push";
const TYPE_PUSH_FULL: &str = "push_full";
const TYPE_PULL_FULL: &str = "pull_full";

/// Derives the stable instance ID for a store: the first 12 hex digits
/// of `sha256("hostname:db_path")`.
pub fn derive_instance_id(hostname: &str, db_path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", hostname, db_path.display()).as_bytes());
    hasher
        .finalize()
        .iter()
        .take(6)
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}

/// The sync engine. Generic over the remote so tests can substitute an
/// in-memory fake for Postgres.
#[derive(Debug, Clone)]
pub struct CloudSync<R: RemoteStore> {
    db: Database,
    remote: R,
    instance_id: String,
}

impl<R: RemoteStore> CloudSync<R> {
    /// Creates an engine for the given local database and remote.
    pub fn new(db: Database, remote: R) -> Self {
        let instance_id = derive_instance_id(&local_hostname(), db.path());
        info!(instance_id = %instance_id, "Sync engine initialized");
        CloudSync {
            db,
            remote,
            instance_id,
        }
    }

    /// This store's identity as seen by the cloud.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The local database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Pushes every pending row to the cloud.
    pub async fn push_changes(&self) -> SyncResult<SyncReport> {
        if !self.remote.is_configured() {
            warn!("Push requested but cloud sync is not configured");
            return Ok(SyncReport::failure(
                SyncDirection::Push,
                SyncError::NotConfigured.to_string(),
            ));
        }
        self.push(TYPE_PUSH).await
    }

    /// Marks every row pending, then pushes. Re-uploads the whole
    /// database, for first-time cloud linking or recovery after cloud
    /// data loss.
    pub async fn push_full(&self) -> SyncResult<SyncReport> {
        if !self.remote.is_configured() {
            warn!("Full push requested but cloud sync is not configured");
            return Ok(SyncReport::failure(
                SyncDirection::Push,
                SyncError::NotConfigured.to_string(),
            ));
        }

        let flipped = self.db.sync().mark_all_pending().await?;
        info!(rows = flipped, "Marked all rows for full push");
        self.push(TYPE_PUSH_FULL).await
    }

    async fn push(&self, sync_type: &str) -> SyncResult<SyncReport> {
        let sync_repo = self.db.sync();

        // Every attempt is journaled, including one that finds nothing
        // to send.
        let log_id = sync_repo.log_sync(sync_type).await?;

        let changes = sync_repo.pending_changes().await?;
        if changes.is_empty() {
            sync_repo
                .update_sync_log(log_id, LOG_SUCCESS, 0, None)
                .await?;
            info!("Nothing to push");
            return Ok(SyncReport::no_changes(SyncDirection::Push));
        }

        info!(records = changes.record_count(), "Pushing changes to cloud");

        let outcome = self.push_inner(&sync_repo, &changes).await;

        match outcome {
            Ok(pushed) => {
                sync_repo
                    .update_sync_log(log_id, LOG_SUCCESS, pushed, None)
                    .await?;
                info!(records = pushed, "Push complete");
                Ok(SyncReport::success(SyncDirection::Push, pushed))
            }
            Err(e) => {
                let message = e.to_string();
                sync_repo
                    .update_sync_log(log_id, LOG_FAILED, 0, Some(&message))
                    .await?;
                warn!(error = %message, "Push failed; rows remain pending");
                Ok(SyncReport::failure(SyncDirection::Push, message))
            }
        }
    }

    async fn push_inner(
        &self,
        sync_repo: &SyncRepository,
        changes: &consign_db::ChangeSet,
    ) -> SyncResult<u64> {
        self.remote.ensure_schema().await?;
        let pushed = self.remote.push_rows(changes, &self.instance_id).await?;
        // The remote has committed; flipping the local flags must come
        // after, never before.
        sync_repo.mark_all_synced().await?;
        Ok(pushed)
    }

    /// Replaces all local data with the cloud dataset.
    ///
    /// `confirm` must be `true`; this deletes local data and is checked
    /// before anything else.
    pub async fn pull_full(&self, confirm: bool) -> SyncResult<SyncReport> {
        if !confirm {
            return Ok(SyncReport::failure(
                SyncDirection::Pull,
                "pull replaces all local data and requires explicit confirmation",
            ));
        }
        if !self.remote.is_configured() {
            warn!("Pull requested but cloud sync is not configured");
            return Ok(SyncReport::failure(
                SyncDirection::Pull,
                SyncError::NotConfigured.to_string(),
            ));
        }

        let sync_repo = self.db.sync();
        let log_id = sync_repo.log_sync(TYPE_PULL_FULL).await?;
        info!("Pulling full dataset from cloud");

        let outcome = self.pull_inner(&sync_repo).await;

        match outcome {
            Ok(imported) => {
                sync_repo
                    .update_sync_log(log_id, LOG_SUCCESS, imported, None)
                    .await?;
                info!(records = imported, "Pull complete");
                Ok(SyncReport::success(SyncDirection::Pull, imported))
            }
            Err(e) => {
                let message = e.to_string();
                sync_repo
                    .update_sync_log(log_id, LOG_FAILED, 0, Some(&message))
                    .await?;
                warn!(error = %message, "Pull failed");
                Ok(SyncReport::failure(SyncDirection::Pull, message))
            }
        }
    }

    async fn pull_inner(&self, sync_repo: &SyncRepository) -> SyncResult<u64> {
        // Fetch before deleting anything: a dead remote must not cost
        // us the local data.
        let cloud = self.remote.fetch_all().await?;
        sync_repo.clear_all_data().await?;
        let imported = sync_repo.bulk_import(&cloud).await?;
        Ok(imported)
    }

    /// Round-trips a trivial query against the remote.
    pub async fn test_connection(&self) -> SyncResult<()> {
        if !self.remote.is_configured() {
            return Err(SyncError::NotConfigured);
        }
        self.remote.test_connection().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use consign_core::{Account, Address, Money, SplitPercent};
    use consign_db::repository::sync::{LOG_FAILED, LOG_SUCCESS};
    use consign_db::{Database, DbConfig};

    use crate::report::SyncStatus;
    use crate::testing::MemoryRemote;

    use super::*;

    fn sample_account(id: &str) -> Account {
        Account {
            account_id: id.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            address: Address {
                street: String::new(),
                city: String::new(),
                state: String::new(),
                zip_code: String::new(),
            },
            account_type: "consignment".to_string(),
            split_percent: SplitPercent::from_percent(60),
            stocking_fee: Money::from_cents(200),
            balance: Money::zero(),
            phone: None,
            email: None,
            created_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        }
    }

    async fn db_with_dirty_account() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.accounts().save(&sample_account("A1001")).await.unwrap();
        db
    }

    #[test]
    fn test_instance_id_is_stable_and_input_sensitive() {
        let a = derive_instance_id("till-1", Path::new("/var/lib/consign.db"));
        let b = derive_instance_id("till-1", Path::new("/var/lib/consign.db"));
        let c = derive_instance_id("till-2", Path::new("/var/lib/consign.db"));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_local_hostname_is_never_empty() {
        assert!(!local_hostname().is_empty());
    }

    #[tokio::test]
    async fn test_push_drains_pending_and_journals() {
        let db = db_with_dirty_account().await;
        let remote = MemoryRemote::new();
        let engine = CloudSync::new(db.clone(), remote.clone());

        let report = engine.push_changes().await.unwrap();
        assert_eq!(report.status, SyncStatus::Success);
        assert_eq!(report.records_synced, 1);

        // Local rows drained, remote holds the account.
        assert!(db.sync().pending_changes().await.unwrap().is_empty());
        assert_eq!(remote.snapshot().accounts.len(), 1);

        let journal = db.sync().history(10).await.unwrap();
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].sync_type, "push");
        assert_eq!(journal[0].status, LOG_SUCCESS);
        assert_eq!(journal[0].records_synced, 1);
    }

    #[tokio::test]
    async fn test_push_with_nothing_pending_is_no_changes() {
        let db = db_with_dirty_account().await;
        let engine = CloudSync::new(db.clone(), MemoryRemote::new());

        engine.push_changes().await.unwrap();
        let report = engine.push_changes().await.unwrap();

        assert_eq!(report.status, SyncStatus::NoChanges);
        assert!(report.is_success());

        // The attempt is still journaled, closed as a zero-record
        // success.
        let journal = db.sync().history(10).await.unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(journal[0].status, LOG_SUCCESS);
        assert_eq!(journal[0].records_synced, 0);
        assert!(journal[0].completed_at.is_some());
    }

    #[tokio::test]
    async fn test_unconfigured_push_fails_without_journaling() {
        let db = db_with_dirty_account().await;
        let engine = CloudSync::new(db.clone(), MemoryRemote::unconfigured());

        let report = engine.push_changes().await.unwrap();
        assert_eq!(report.status, SyncStatus::Failed);
        assert!(report.error.as_deref().unwrap().contains("not configured"));

        // Nothing journaled, nothing drained.
        assert!(db.sync().history(10).await.unwrap().is_empty());
        assert_eq!(db.sync().pending_changes().await.unwrap().record_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_push_leaves_rows_pending() {
        let db = db_with_dirty_account().await;
        let engine = CloudSync::new(db.clone(), MemoryRemote::failing());

        let report = engine.push_changes().await.unwrap();
        assert_eq!(report.status, SyncStatus::Failed);

        // Rows still pending for the next attempt, failure journaled.
        assert_eq!(db.sync().pending_changes().await.unwrap().record_count(), 1);
        let journal = db.sync().history(10).await.unwrap();
        assert_eq!(journal[0].status, LOG_FAILED);
        assert!(journal[0].error_message.is_some());
    }

    #[tokio::test]
    async fn test_push_full_resends_synced_rows() {
        let db = db_with_dirty_account().await;
        let remote = MemoryRemote::new();
        let engine = CloudSync::new(db.clone(), remote.clone());

        engine.push_changes().await.unwrap();
        assert!(db.sync().pending_changes().await.unwrap().is_empty());

        let report = engine.push_full().await.unwrap();
        assert_eq!(report.status, SyncStatus::Success);
        assert_eq!(report.records_synced, 1);

        let journal = db.sync().history(10).await.unwrap();
        assert_eq!(journal[0].sync_type, "push_full");
    }

    #[tokio::test]
    async fn test_pull_requires_confirmation_first() {
        // Even an unconfigured engine reports the missing confirmation,
        // not the missing config.
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = CloudSync::new(db.clone(), MemoryRemote::unconfigured());

        let report = engine.pull_full(false).await.unwrap();
        assert_eq!(report.status, SyncStatus::Failed);
        assert!(report.error.as_deref().unwrap().contains("confirmation"));
        assert!(db.sync().history(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pull_replaces_local_data() {
        // Store A pushes its account to the fake cloud.
        let db_a = db_with_dirty_account().await;
        let remote = MemoryRemote::new();
        let engine_a = CloudSync::new(db_a, remote.clone());
        engine_a.push_changes().await.unwrap();

        // Store B has different local data; the pull replaces it.
        let db_b = Database::new(DbConfig::in_memory()).await.unwrap();
        db_b.accounts().save(&sample_account("A2001")).await.unwrap();
        let engine_b = CloudSync::new(db_b.clone(), remote);

        let report = engine_b.pull_full(true).await.unwrap();
        assert_eq!(report.status, SyncStatus::Success);
        assert_eq!(report.records_synced, 1);

        let accounts = db_b.accounts().load_all().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_id, "A1001");

        // Imported rows land synced: nothing to push afterwards.
        assert!(db_b.sync().pending_changes().await.unwrap().is_empty());

        let journal = db_b.sync().history(10).await.unwrap();
        assert_eq!(journal[0].sync_type, "pull_full");
        assert_eq!(journal[0].status, LOG_SUCCESS);
    }

    #[tokio::test]
    async fn test_failed_pull_keeps_local_data() {
        let db = db_with_dirty_account().await;
        let engine = CloudSync::new(db.clone(), MemoryRemote::failing());

        let report = engine.pull_full(true).await.unwrap();
        assert_eq!(report.status, SyncStatus::Failed);

        // The fetch failed before anything was deleted.
        assert_eq!(db.accounts().load_all().await.unwrap().len(), 1);
        assert_eq!(db.sync().history(10).await.unwrap()[0].status, LOG_FAILED);
    }
}
