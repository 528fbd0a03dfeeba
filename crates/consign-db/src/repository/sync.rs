//! # Sync Repository
//!
//! Dirty tracking, bulk import, and the local sync journal.
//!
//! ## Dirty Tracking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Row-Level Dirty Tracking                             │
//! │                                                                         │
//! │  LOCAL WRITE (any repository save)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  row.sync_status = 'pending', row.modified_at = now                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PUSH (consign-sync)                                                   │
//! │  1. pending_changes()  ← SELECT dirty rows from all five tables        │
//! │  2. upload to cloud                                                    │
//! │  3. mark_all_synced()  ← only after the cloud commit succeeds          │
//! │                                                                         │
//! │  KEY GUARANTEES:                                                       │
//! │  • A failed push leaves every row pending (retried next time)          │
//! │  • Offline? No problem - dirty rows accumulate                         │
//! │  • Dirty state lives on the rows themselves, no separate queue to      │
//! │    drift out of sync with the data                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The journal (`sync_log`) is local-only history of sync attempts and
//! is never pushed.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::rows::{
    AccountRow, ChangeSet, ConfigRow, ItemRow, PayoutRow, SaleRow, SyncLogRow, SYNC_PENDING,
    SYNC_SYNCED,
};

/// Journal status for a sync attempt that has started.
pub const LOG_IN_PROGRESS: &str = "in_progress";

/// Journal status for a completed sync.
pub const LOG_SUCCESS: &str = "success";

/// Journal status for a failed sync.
pub const LOG_FAILED: &str = "failed";

/// Tables that participate in sync, in dependency order.
const SYNCED_TABLES: [&str; 5] = ["store_config", "accounts", "items", "sales", "payouts"];

/// Repository for sync state and the sync journal.
#[derive(Debug, Clone)]
pub struct SyncRepository {
    pool: SqlitePool,
}

impl SyncRepository {
    /// Creates a new SyncRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncRepository { pool }
    }

    // =========================================================================
    // Dirty Tracking
    // =========================================================================

    /// Collects every pending row across all synced tables.
    pub async fn pending_changes(&self) -> DbResult<ChangeSet> {
        let config = sqlx::query_as::<_, ConfigRow>(
            "SELECT * FROM store_config WHERE sync_status = ?1 ORDER BY key",
        )
        .bind(SYNC_PENDING)
        .fetch_all(&self.pool)
        .await?;
        let accounts = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE sync_status = ?1 ORDER BY account_id",
        )
        .bind(SYNC_PENDING)
        .fetch_all(&self.pool)
        .await?;
        let items = sqlx::query_as::<_, ItemRow>(
            "SELECT * FROM items WHERE sync_status = ?1 ORDER BY item_id",
        )
        .bind(SYNC_PENDING)
        .fetch_all(&self.pool)
        .await?;
        let sales = sqlx::query_as::<_, SaleRow>(
            "SELECT * FROM sales WHERE sync_status = ?1 ORDER BY item_id",
        )
        .bind(SYNC_PENDING)
        .fetch_all(&self.pool)
        .await?;
        let payouts = sqlx::query_as::<_, PayoutRow>(
            "SELECT * FROM payouts WHERE sync_status = ?1 ORDER BY payout_id",
        )
        .bind(SYNC_PENDING)
        .fetch_all(&self.pool)
        .await?;

        let change_set = ChangeSet {
            config,
            accounts,
            items,
            sales,
            payouts,
        };
        debug!(records = change_set.record_count(), "Collected pending changes");
        Ok(change_set)
    }

    /// Marks every pending row synced. Returns the number of rows
    /// flipped. Called only after the cloud has durably committed.
    pub async fn mark_all_synced(&self) -> DbResult<u64> {
        self.flip_all(SYNC_PENDING, SYNC_SYNCED).await
    }

    /// Marks every row pending, forcing the next push to resend the
    /// whole database. Returns the number of rows flipped.
    pub async fn mark_all_pending(&self) -> DbResult<u64> {
        self.flip_all(SYNC_SYNCED, SYNC_PENDING).await
    }

    async fn flip_all(&self, from: &str, to: &str) -> DbResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut flipped = 0u64;

        for table in SYNCED_TABLES {
            let result = sqlx::query(&format!(
                "UPDATE {} SET sync_status = ?1 WHERE sync_status = ?2",
                table
            ))
            .bind(to)
            .bind(from)
            .execute(&mut *tx)
            .await?;
            flipped += result.rows_affected();
        }

        tx.commit().await?;
        debug!(rows = flipped, from = from, to = to, "Flipped sync status");
        Ok(flipped)
    }

    // =========================================================================
    // Pull Support
    // =========================================================================

    /// Deletes every business row. The sync journal survives.
    ///
    /// Only the pull path calls this, immediately before a
    /// [`bulk_import`](Self::bulk_import) of the cloud state.
    pub async fn clear_all_data(&self) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        // Children before parents for foreign keys.
        for table in ["sales", "payouts", "items", "accounts", "store_config"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Cleared all local business data");
        Ok(())
    }

    /// Imports a full change set in one transaction.
    ///
    /// Imported rows land `'synced'`: they just came from the cloud, so
    /// pushing them back would be a no-op at best and a clobber at
    /// worst. `modified_at` is stamped with the import time.
    pub async fn bulk_import(&self, change_set: &ChangeSet) -> DbResult<u64> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for row in &change_set.config {
            import_config(&mut tx, row, &now).await?;
        }
        for row in &change_set.accounts {
            import_account(&mut tx, row, &now).await?;
        }
        for row in &change_set.items {
            import_item(&mut tx, row, &now).await?;
        }
        for row in &change_set.sales {
            import_sale(&mut tx, row, &now).await?;
        }
        for row in &change_set.payouts {
            import_payout(&mut tx, row, &now).await?;
        }

        tx.commit().await?;

        let imported = change_set.record_count();
        info!(records = imported, "Bulk import complete");
        Ok(imported)
    }

    // =========================================================================
    // Sync Journal
    // =========================================================================

    /// Opens a journal entry for a sync attempt. Returns its row ID.
    pub async fn log_sync(&self, sync_type: &str) -> DbResult<i64> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO sync_log (sync_type, started_at, status, records_synced)
            VALUES (?1, ?2, ?3, 0)
            "#,
        )
        .bind(sync_type)
        .bind(&now)
        .bind(LOG_IN_PROGRESS)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Completes a journal entry with the final status.
    pub async fn update_sync_log(
        &self,
        log_id: i64,
        status: &str,
        records_synced: u64,
        error_message: Option<&str>,
    ) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            UPDATE sync_log
            SET completed_at = ?1, status = ?2, records_synced = ?3, error_message = ?4
            WHERE id = ?5
            "#,
        )
        .bind(&now)
        .bind(status)
        .bind(records_synced as i64)
        .bind(error_message)
        .bind(log_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Completion time of the most recent successful sync, if any.
    pub async fn last_successful_sync(&self) -> DbResult<Option<String>> {
        let completed: Option<String> = sqlx::query_scalar(
            "SELECT MAX(completed_at) FROM sync_log WHERE status = ?1",
        )
        .bind(LOG_SUCCESS)
        .fetch_one(&self.pool)
        .await?;

        Ok(completed)
    }

    /// The most recent journal entries, newest first.
    pub async fn history(&self, limit: i64) -> DbResult<Vec<SyncLogRow>> {
        let rows = sqlx::query_as::<_, SyncLogRow>(
            "SELECT * FROM sync_log ORDER BY id DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Import Helpers
// =============================================================================
// Same upsert shapes as the repositories, but the caller controls the
// sync_status (always 'synced' for imports).

async fn import_config(tx: &mut Transaction<'_, Sqlite>, row: &ConfigRow, now: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO store_config (key, value, modified_at, sync_status)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            modified_at = excluded.modified_at,
            sync_status = excluded.sync_status
        "#,
    )
    .bind(&row.key)
    .bind(&row.value)
    .bind(now)
    .bind(SYNC_SYNCED)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn import_account(
    tx: &mut Transaction<'_, Sqlite>,
    row: &AccountRow,
    now: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts (
            account_id, first_name, last_name, street, city, state, zip_code,
            account_type, split_bps, stocking_fee_cents, balance_cents,
            phone, email, created_date, modified_at, sync_status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        ON CONFLICT(account_id) DO UPDATE SET
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            street = excluded.street,
            city = excluded.city,
            state = excluded.state,
            zip_code = excluded.zip_code,
            account_type = excluded.account_type,
            split_bps = excluded.split_bps,
            stocking_fee_cents = excluded.stocking_fee_cents,
            balance_cents = excluded.balance_cents,
            phone = excluded.phone,
            email = excluded.email,
            created_date = excluded.created_date,
            modified_at = excluded.modified_at,
            sync_status = excluded.sync_status
        "#,
    )
    .bind(&row.account_id)
    .bind(&row.first_name)
    .bind(&row.last_name)
    .bind(&row.street)
    .bind(&row.city)
    .bind(&row.state)
    .bind(&row.zip_code)
    .bind(&row.account_type)
    .bind(row.split_bps)
    .bind(row.stocking_fee_cents)
    .bind(row.balance_cents)
    .bind(&row.phone)
    .bind(&row.email)
    .bind(&row.created_date)
    .bind(now)
    .bind(SYNC_SYNCED)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn import_item(tx: &mut Transaction<'_, Sqlite>, row: &ItemRow, now: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO items (
            item_id, account_id, name, description, original_price_cents,
            entry_date, status, status_date, modified_at, sync_status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        ON CONFLICT(item_id) DO UPDATE SET
            account_id = excluded.account_id,
            name = excluded.name,
            description = excluded.description,
            original_price_cents = excluded.original_price_cents,
            entry_date = excluded.entry_date,
            status = excluded.status,
            status_date = excluded.status_date,
            modified_at = excluded.modified_at,
            sync_status = excluded.sync_status
        "#,
    )
    .bind(&row.item_id)
    .bind(&row.account_id)
    .bind(&row.name)
    .bind(&row.description)
    .bind(row.original_price_cents)
    .bind(&row.entry_date)
    .bind(&row.status)
    .bind(&row.status_date)
    .bind(now)
    .bind(SYNC_SYNCED)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn import_sale(tx: &mut Transaction<'_, Sqlite>, row: &SaleRow, now: &str) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            item_id, account_id, sale_date, original_price_cents, sale_price_cents,
            discount_percent, stocking_fee_cents, account_share_cents,
            store_share_cents, modified_at, sync_status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(item_id) DO UPDATE SET
            account_id = excluded.account_id,
            sale_date = excluded.sale_date,
            original_price_cents = excluded.original_price_cents,
            sale_price_cents = excluded.sale_price_cents,
            discount_percent = excluded.discount_percent,
            stocking_fee_cents = excluded.stocking_fee_cents,
            account_share_cents = excluded.account_share_cents,
            store_share_cents = excluded.store_share_cents,
            modified_at = excluded.modified_at,
            sync_status = excluded.sync_status
        "#,
    )
    .bind(&row.item_id)
    .bind(&row.account_id)
    .bind(&row.sale_date)
    .bind(row.original_price_cents)
    .bind(row.sale_price_cents)
    .bind(row.discount_percent)
    .bind(row.stocking_fee_cents)
    .bind(row.account_share_cents)
    .bind(row.store_share_cents)
    .bind(now)
    .bind(SYNC_SYNCED)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn import_payout(
    tx: &mut Transaction<'_, Sqlite>,
    row: &PayoutRow,
    now: &str,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payouts (
            payout_id, account_id, payout_date, amount_cents,
            check_number, modified_at, sync_status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(payout_id) DO UPDATE SET
            account_id = excluded.account_id,
            payout_date = excluded.payout_date,
            amount_cents = excluded.amount_cents,
            check_number = excluded.check_number,
            modified_at = excluded.modified_at,
            sync_status = excluded.sync_status
        "#,
    )
    .bind(&row.payout_id)
    .bind(&row.account_id)
    .bind(&row.payout_date)
    .bind(row.amount_cents)
    .bind(&row.check_number)
    .bind(now)
    .bind(SYNC_SYNCED)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use consign_core::{Account, Address, Money, SplitPercent};

    use crate::pool::{Database, DbConfig};

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

    #[tokio::test]
    async fn test_saves_are_pending_until_marked() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.accounts().save(&sample_account("A1001")).await.unwrap();
        db.config().set("store_name", "Attic Finds").await.unwrap();

        let pending = db.sync().pending_changes().await.unwrap();
        assert_eq!(pending.record_count(), 2);
        assert_eq!(pending.accounts.len(), 1);
        assert_eq!(pending.config.len(), 1);

        let flipped = db.sync().mark_all_synced().await.unwrap();
        assert_eq!(flipped, 2);
        assert!(db.sync().pending_changes().await.unwrap().is_empty());

        // A fresh save re-dirties just that row.
        db.accounts().save(&sample_account("A1001")).await.unwrap();
        let pending = db.sync().pending_changes().await.unwrap();
        assert_eq!(pending.record_count(), 1);
    }

    #[tokio::test]
    async fn test_mark_all_pending_resends_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.accounts().save(&sample_account("A1001")).await.unwrap();
        db.sync().mark_all_synced().await.unwrap();

        let flipped = db.sync().mark_all_pending().await.unwrap();
        assert_eq!(flipped, 1);
        assert_eq!(db.sync().pending_changes().await.unwrap().record_count(), 1);
    }

    #[tokio::test]
    async fn test_bulk_import_lands_synced() {
        let source = Database::new(DbConfig::in_memory()).await.unwrap();
        source.accounts().save(&sample_account("A1001")).await.unwrap();
        let change_set = source.sync().pending_changes().await.unwrap();

        let target = Database::new(DbConfig::in_memory()).await.unwrap();
        let imported = target.sync().bulk_import(&change_set).await.unwrap();
        assert_eq!(imported, 1);

        // Imported rows are not re-pushed.
        assert!(target.sync().pending_changes().await.unwrap().is_empty());
        assert!(target.accounts().get("A1001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_all_data_preserves_journal() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.accounts().save(&sample_account("A1001")).await.unwrap();
        let log_id = db.sync().log_sync("push").await.unwrap();
        db.sync()
            .update_sync_log(log_id, LOG_SUCCESS, 1, None)
            .await
            .unwrap();

        db.sync().clear_all_data().await.unwrap();

        assert!(db.accounts().load_all().await.unwrap().is_empty());
        assert_eq!(db.sync().history(10).await.unwrap().len(), 1);
        assert!(db.sync().last_successful_sync().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_journal_lifecycle() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sync = db.sync();

        let id = sync.log_sync("push").await.unwrap();
        let open = &sync.history(10).await.unwrap()[0];
        assert_eq!(open.status, LOG_IN_PROGRESS);
        assert!(open.completed_at.is_none());
        assert!(sync.last_successful_sync().await.unwrap().is_none());

        sync.update_sync_log(id, LOG_FAILED, 0, Some("connection refused"))
            .await
            .unwrap();
        let closed = &sync.history(10).await.unwrap()[0];
        assert_eq!(closed.status, LOG_FAILED);
        assert_eq!(closed.error_message.as_deref(), Some("connection refused"));

        // Failures don't count as a successful sync.
        assert!(sync.last_successful_sync().await.unwrap().is_none());
    }
}
