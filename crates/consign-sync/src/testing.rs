//! In-memory [`RemoteStore`] fake shared by the engine and auto-sync
//! tests. Mimics the cloud's upsert-by-business-ID semantics.

use std::sync::{Arc, Mutex};

use consign_db::ChangeSet;

use crate::error::{SyncError, SyncResult};
use crate::remote::RemoteStore;

/// Fake cloud store. Clones share state, so a test can keep a handle
/// to inspect what the engine pushed.
#[derive(Debug, Clone)]
pub struct MemoryRemote {
    configured: bool,
    fail_push: bool,
    state: Arc<Mutex<ChangeSet>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        MemoryRemote {
            configured: true,
            fail_push: false,
            state: Arc::new(Mutex::new(ChangeSet::default())),
        }
    }

    pub fn unconfigured() -> Self {
        MemoryRemote {
            configured: false,
            ..Self::new()
        }
    }

    /// Every subsequent push fails with a connection error.
    pub fn failing() -> Self {
        MemoryRemote {
            fail_push: true,
            ..Self::new()
        }
    }

    /// Replaces the fake cloud's entire dataset.
    pub fn seed(&self, data: ChangeSet) {
        *self.state.lock().unwrap() = data;
    }

    /// Snapshot of the fake cloud's dataset.
    pub fn snapshot(&self) -> ChangeSet {
        self.state.lock().unwrap().clone()
    }
}

fn upsert_by_key<T: Clone>(existing: &mut Vec<T>, incoming: &[T], same_key: impl Fn(&T, &T) -> bool) {
    for row in incoming {
        existing.retain(|r| !same_key(r, row));
        existing.push(row.clone());
    }
}

impl RemoteStore for MemoryRemote {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn test_connection(&self) -> SyncResult<()> {
        if self.fail_push {
            return Err(SyncError::Remote("connection refused".to_string()));
        }
        Ok(())
    }

    async fn ensure_schema(&self) -> SyncResult<()> {
        Ok(())
    }

    async fn push_rows(&self, changes: &ChangeSet, _source_instance: &str) -> SyncResult<u64> {
        if self.fail_push {
            return Err(SyncError::Remote("connection refused".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        upsert_by_key(&mut state.config, &changes.config, |a, b| a.key == b.key);
        upsert_by_key(&mut state.accounts, &changes.accounts, |a, b| {
            a.account_id == b.account_id
        });
        upsert_by_key(&mut state.items, &changes.items, |a, b| a.item_id == b.item_id);
        upsert_by_key(&mut state.sales, &changes.sales, |a, b| a.item_id == b.item_id);
        upsert_by_key(&mut state.payouts, &changes.payouts, |a, b| {
            a.payout_id == b.payout_id
        });

        Ok(changes.record_count())
    }

    async fn fetch_all(&self) -> SyncResult<ChangeSet> {
        if self.fail_push {
            return Err(SyncError::Remote("connection refused".to_string()));
        }
        Ok(self.state.lock().unwrap().clone())
    }
}
