//! # Remote Store
//!
//! The cloud side of the sync protocol, behind a trait so the engine is
//! testable without a live Postgres.
//!
//! ## Cloud Schema
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  The cloud mirrors the five local business tables, with two extra      │
//! │  columns on each:                                                       │
//! │                                                                         │
//! │    source_instance  TEXT   which store last wrote this row             │
//! │    synced_at        TIMESTAMPTZ   when the cloud accepted it           │
//! │                                                                         │
//! │  Rows are keyed by the same business IDs as locally, so two stores     │
//! │  pushing the same ID resolve last-write-wins at the row level.         │
//! │                                                                         │
//! │  sync_history records one row per accepted push, for fleet-level       │
//! │  visibility into which stores are syncing.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

use consign_db::rows::{AccountRow, ConfigRow, ItemRow, PayoutRow, SaleRow};
use consign_db::ChangeSet;

use crate::config::CloudConfig;
use crate::error::{SyncError, SyncResult};

/// Cloud-side operations the sync engine needs.
///
/// [`PgRemote`] is the production implementation; tests substitute an
/// in-memory fake.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Whether credentials exist at all. A `false` here short-circuits
    /// every sync operation before any network traffic.
    fn is_configured(&self) -> bool;

    /// Verifies the remote is reachable and accepting queries.
    async fn test_connection(&self) -> SyncResult<()>;

    /// Creates the cloud tables if they don't exist. Idempotent.
    async fn ensure_schema(&self) -> SyncResult<()>;

    /// Upserts every row of the change set in one remote transaction,
    /// tagged with the pushing store's instance ID. Returns the number
    /// of rows written.
    async fn push_rows(&self, changes: &ChangeSet, source_instance: &str) -> SyncResult<u64>;

    /// Downloads the entire cloud dataset.
    async fn fetch_all(&self) -> SyncResult<ChangeSet>;
}

// =============================================================================
// Postgres Implementation
// =============================================================================

/// Cloud store backed by Postgres.
///
/// Connections are opened per operation and closed afterwards: syncs
/// are minutes apart and a store shouldn't hold an idle connection to
/// the cloud in between.
#[derive(Debug, Clone)]
pub struct PgRemote {
    config: Option<CloudConfig>,
}

impl PgRemote {
    /// Creates a remote from an optional configuration. `None` produces
    /// a permanently unconfigured remote.
    pub fn new(config: Option<CloudConfig>) -> Self {
        PgRemote { config }
    }

    /// Creates a remote from `CONSIGN_CLOUD_*` environment variables.
    pub fn from_env() -> Self {
        PgRemote {
            config: CloudConfig::from_env(),
        }
    }

    async fn connect(&self) -> SyncResult<PgPool> {
        let config = self.config.as_ref().ok_or(SyncError::NotConfigured)?;
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect_with(config.connect_options()?)
            .await?;
        debug!(host = %config.host, "Connected to cloud database");
        Ok(pool)
    }
}

impl RemoteStore for PgRemote {
    fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    async fn test_connection(&self) -> SyncResult<()> {
        let pool = self.connect().await?;
        let result = sqlx::query("SELECT 1").execute(&pool).await;
        pool.close().await;
        result?;
        Ok(())
    }

    async fn ensure_schema(&self) -> SyncResult<()> {
        let pool = self.connect().await?;
        let result = create_schema(&pool).await;
        pool.close().await;
        result
    }

    async fn push_rows(&self, changes: &ChangeSet, source_instance: &str) -> SyncResult<u64> {
        let pool = self.connect().await?;
        let result = push_all(&pool, changes, source_instance).await;
        pool.close().await;

        let pushed = result?;
        info!(records = pushed, "Pushed rows to cloud");
        Ok(pushed)
    }

    async fn fetch_all(&self) -> SyncResult<ChangeSet> {
        let pool = self.connect().await?;
        let result = fetch_everything(&pool).await;
        pool.close().await;

        let change_set = result?;
        info!(records = change_set.record_count(), "Fetched cloud dataset");
        Ok(change_set)
    }
}

// =============================================================================
// Schema
// =============================================================================

const CLOUD_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS store_config (
        key             TEXT PRIMARY KEY,
        value           TEXT NOT NULL,
        modified_at     TEXT NOT NULL,
        source_instance TEXT NOT NULL,
        synced_at       TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        account_id          TEXT PRIMARY KEY,
        first_name          TEXT NOT NULL,
        last_name           TEXT NOT NULL,
        street              TEXT NOT NULL DEFAULT '',
        city                TEXT NOT NULL DEFAULT '',
        state               TEXT NOT NULL DEFAULT '',
        zip_code            TEXT NOT NULL DEFAULT '',
        account_type        TEXT NOT NULL DEFAULT 'consignment',
        split_bps           BIGINT NOT NULL,
        stocking_fee_cents  BIGINT NOT NULL,
        balance_cents       BIGINT NOT NULL DEFAULT 0,
        phone               TEXT,
        email               TEXT,
        created_date        TEXT NOT NULL,
        modified_at         TEXT NOT NULL,
        source_instance     TEXT NOT NULL,
        synced_at           TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS items (
        item_id                 TEXT PRIMARY KEY,
        account_id              TEXT NOT NULL,
        name                    TEXT NOT NULL,
        description             TEXT NOT NULL DEFAULT '',
        original_price_cents    BIGINT NOT NULL,
        entry_date              TEXT NOT NULL,
        status                  TEXT NOT NULL,
        status_date             TEXT NOT NULL,
        modified_at             TEXT NOT NULL,
        source_instance         TEXT NOT NULL,
        synced_at               TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales (
        item_id                 TEXT PRIMARY KEY,
        account_id              TEXT NOT NULL,
        sale_date               TEXT NOT NULL,
        original_price_cents    BIGINT NOT NULL,
        sale_price_cents        BIGINT NOT NULL,
        discount_percent        BIGINT NOT NULL DEFAULT 0,
        stocking_fee_cents      BIGINT NOT NULL,
        account_share_cents     BIGINT NOT NULL,
        store_share_cents       BIGINT NOT NULL,
        modified_at             TEXT NOT NULL,
        source_instance         TEXT NOT NULL,
        synced_at               TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payouts (
        payout_id       TEXT PRIMARY KEY,
        account_id      TEXT NOT NULL,
        payout_date     TEXT NOT NULL,
        amount_cents    BIGINT NOT NULL,
        check_number    TEXT,
        modified_at     TEXT NOT NULL,
        source_instance TEXT NOT NULL,
        synced_at       TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sync_history (
        id              BIGSERIAL PRIMARY KEY,
        source_instance TEXT NOT NULL,
        records         BIGINT NOT NULL,
        pushed_at       TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
];

async fn create_schema(pool: &PgPool) -> SyncResult<()> {
    for statement in CLOUD_SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("Cloud schema verified");
    Ok(())
}

// =============================================================================
// Push
// =============================================================================

async fn push_all(pool: &PgPool, changes: &ChangeSet, source: &str) -> SyncResult<u64> {
    let mut tx = pool.begin().await?;

    for row in &changes.config {
        push_config(&mut tx, row, source).await?;
    }
    for row in &changes.accounts {
        push_account(&mut tx, row, source).await?;
    }
    for row in &changes.items {
        push_item(&mut tx, row, source).await?;
    }
    for row in &changes.sales {
        push_sale(&mut tx, row, source).await?;
    }
    for row in &changes.payouts {
        push_payout(&mut tx, row, source).await?;
    }

    let pushed = changes.record_count();
    sqlx::query("INSERT INTO sync_history (source_instance, records) VALUES ($1, $2)")
        .bind(source)
        .bind(pushed as i64)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(pushed)
}

async fn push_config(
    tx: &mut Transaction<'_, Postgres>,
    row: &ConfigRow,
    source: &str,
) -> SyncResult<()> {
    sqlx::query(
        r#"
        INSERT INTO store_config (key, value, modified_at, source_instance)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (key) DO UPDATE SET
            value = EXCLUDED.value,
            modified_at = EXCLUDED.modified_at,
            source_instance = EXCLUDED.source_instance,
            synced_at = now()
        "#,
    )
    .bind(&row.key)
    .bind(&row.value)
    .bind(&row.modified_at)
    .bind(source)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn push_account(
    tx: &mut Transaction<'_, Postgres>,
    row: &AccountRow,
    source: &str,
) -> SyncResult<()> {
    sqlx::query(
        r#"
        INSERT INTO accounts (
            account_id, first_name, last_name, street, city, state, zip_code,
            account_type, split_bps, stocking_fee_cents, balance_cents,
            phone, email, created_date, modified_at, source_instance
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ON CONFLICT (account_id) DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            street = EXCLUDED.street,
            city = EXCLUDED.city,
            state = EXCLUDED.state,
            zip_code = EXCLUDED.zip_code,
            account_type = EXCLUDED.account_type,
            split_bps = EXCLUDED.split_bps,
            stocking_fee_cents = EXCLUDED.stocking_fee_cents,
            balance_cents = EXCLUDED.balance_cents,
            phone = EXCLUDED.phone,
            email = EXCLUDED.email,
            created_date = EXCLUDED.created_date,
            modified_at = EXCLUDED.modified_at,
            source_instance = EXCLUDED.source_instance,
            synced_at = now()
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
    .bind(&row.modified_at)
    .bind(source)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn push_item(
    tx: &mut Transaction<'_, Postgres>,
    row: &ItemRow,
    source: &str,
) -> SyncResult<()> {
    sqlx::query(
        r#"
        INSERT INTO items (
            item_id, account_id, name, description, original_price_cents,
            entry_date, status, status_date, modified_at, source_instance
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (item_id) DO UPDATE SET
            account_id = EXCLUDED.account_id,
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            original_price_cents = EXCLUDED.original_price_cents,
            entry_date = EXCLUDED.entry_date,
            status = EXCLUDED.status,
            status_date = EXCLUDED.status_date,
            modified_at = EXCLUDED.modified_at,
            source_instance = EXCLUDED.source_instance,
            synced_at = now()
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
    .bind(&row.modified_at)
    .bind(source)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn push_sale(
    tx: &mut Transaction<'_, Postgres>,
    row: &SaleRow,
    source: &str,
) -> SyncResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            item_id, account_id, sale_date, original_price_cents, sale_price_cents,
            discount_percent, stocking_fee_cents, account_share_cents,
            store_share_cents, modified_at, source_instance
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (item_id) DO UPDATE SET
            account_id = EXCLUDED.account_id,
            sale_date = EXCLUDED.sale_date,
            original_price_cents = EXCLUDED.original_price_cents,
            sale_price_cents = EXCLUDED.sale_price_cents,
            discount_percent = EXCLUDED.discount_percent,
            stocking_fee_cents = EXCLUDED.stocking_fee_cents,
            account_share_cents = EXCLUDED.account_share_cents,
            store_share_cents = EXCLUDED.store_share_cents,
            modified_at = EXCLUDED.modified_at,
            source_instance = EXCLUDED.source_instance,
            synced_at = now()
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
    .bind(&row.modified_at)
    .bind(source)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn push_payout(
    tx: &mut Transaction<'_, Postgres>,
    row: &PayoutRow,
    source: &str,
) -> SyncResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payouts (
            payout_id, account_id, payout_date, amount_cents,
            check_number, modified_at, source_instance
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (payout_id) DO UPDATE SET
            account_id = EXCLUDED.account_id,
            payout_date = EXCLUDED.payout_date,
            amount_cents = EXCLUDED.amount_cents,
            check_number = EXCLUDED.check_number,
            modified_at = EXCLUDED.modified_at,
            source_instance = EXCLUDED.source_instance,
            synced_at = now()
        "#,
    )
    .bind(&row.payout_id)
    .bind(&row.account_id)
    .bind(&row.payout_date)
    .bind(row.amount_cents)
    .bind(&row.check_number)
    .bind(&row.modified_at)
    .bind(source)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// =============================================================================
// Fetch
// =============================================================================
// The cloud doesn't track local dirty state, so fetched rows are
// synthesized with sync_status = 'synced'.

async fn fetch_everything(pool: &PgPool) -> SyncResult<ChangeSet> {
    let config = sqlx::query_as::<_, ConfigRow>(
        "SELECT key, value, modified_at, 'synced' AS sync_status FROM store_config ORDER BY key",
    )
    .fetch_all(pool)
    .await?;

    let accounts = sqlx::query_as::<_, AccountRow>(
        r#"
        SELECT account_id, first_name, last_name, street, city, state, zip_code,
               account_type, split_bps, stocking_fee_cents, balance_cents,
               phone, email, created_date, modified_at, 'synced' AS sync_status
        FROM accounts ORDER BY account_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let items = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT item_id, account_id, name, description, original_price_cents,
               entry_date, status, status_date, modified_at, 'synced' AS sync_status
        FROM items ORDER BY item_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let sales = sqlx::query_as::<_, SaleRow>(
        r#"
        SELECT item_id, account_id, sale_date, original_price_cents, sale_price_cents,
               discount_percent, stocking_fee_cents, account_share_cents,
               store_share_cents, modified_at, 'synced' AS sync_status
        FROM sales ORDER BY item_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let payouts = sqlx::query_as::<_, PayoutRow>(
        r#"
        SELECT payout_id, account_id, payout_date, amount_cents, check_number,
               modified_at, 'synced' AS sync_status
        FROM payouts ORDER BY payout_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(ChangeSet {
        config,
        accounts,
        items,
        sales,
        payouts,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
