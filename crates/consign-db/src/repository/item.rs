//! # Item Repository
//!
//! CRUD for `items` rows and their companion `sales` rows.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save(sold item)                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. UPSERT items   SET status = 'sold', sync_status = 'pending'│   │
//! │  │  2. UPSERT sales   (split breakdown), sync_status = 'pending'  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← An item can never be 'sold' without its sale row             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use consign_core::Item;

use crate::error::DbResult;
use crate::rows::{ItemRow, SaleRow, SYNC_PENDING};

/// Repository for item operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Inserts or updates an item, marking the row dirty.
    ///
    /// If the item carries a sale record, the sale row is upserted in
    /// the same transaction.
    pub async fn save(&self, item: &Item) -> DbResult<()> {
        let row = ItemRow::from_domain(item);
        let now = Utc::now().to_rfc3339();

        debug!(item_id = %row.item_id, status = %row.status, "Saving item");

        let mut tx = self.pool.begin().await?;

        upsert_item(&mut tx, &row, &now).await?;

        if let Some(sale) = &item.sale_record {
            let sale_row = SaleRow::from_domain(&item.account_id, sale);
            upsert_sale(&mut tx, &sale_row, &now).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetches a single item by ID, with its sale record if sold.
    pub async fn get(&self, item_id: &str) -> DbResult<Option<Item>> {
        let row = sqlx::query_as::<_, ItemRow>("SELECT * FROM items WHERE item_id = ?1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let sale = sqlx::query_as::<_, SaleRow>("SELECT * FROM sales WHERE item_id = ?1")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?;

        row.into_domain(sale).map(Some)
    }

    /// Loads every item with its sale record, in ID order.
    pub async fn load_all(&self) -> DbResult<Vec<Item>> {
        let item_rows = sqlx::query_as::<_, ItemRow>("SELECT * FROM items ORDER BY item_id")
            .fetch_all(&self.pool)
            .await?;
        let sale_rows = sqlx::query_as::<_, SaleRow>("SELECT * FROM sales")
            .fetch_all(&self.pool)
            .await?;

        let mut sales: std::collections::HashMap<String, SaleRow> = sale_rows
            .into_iter()
            .map(|s| (s.item_id.clone(), s))
            .collect();

        item_rows
            .into_iter()
            .map(|row| {
                let sale = sales.remove(&row.item_id);
                row.into_domain(sale)
            })
            .collect()
    }
}

async fn upsert_item(tx: &mut Transaction<'_, Sqlite>, row: &ItemRow, now: &str) -> DbResult<()> {
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
    .bind(SYNC_PENDING)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn upsert_sale(tx: &mut Transaction<'_, Sqlite>, row: &SaleRow, now: &str) -> DbResult<()> {
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
    .bind(SYNC_PENDING)
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

    use consign_core::{
        Address, ConsignmentStore, Money, NewAccount, NewItem,
    };

    use crate::pool::{Database, DbConfig};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Store with one account and one item, sold on 2026-01-01.
    fn sold_store() -> (ConsignmentStore, String, String) {
        let mut store = ConsignmentStore::default();
        let account_id = store
            .add_account(NewAccount {
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                address: Address {
                    street: String::new(),
                    city: String::new(),
                    state: String::new(),
                    zip_code: String::new(),
                },
                account_type: None,
                split_percent: None,
                stocking_fee: None,
                phone: None,
                email: None,
            })
            .unwrap()
            .account_id
            .clone();
        let item_id = store
            .add_item(
                &account_id,
                NewItem {
                    name: "Chair".to_string(),
                    description: String::new(),
                    price: Money::from_cents(10000),
                    entry_date: Some(date(2026, 1, 1)),
                },
            )
            .unwrap()
            .item_id
            .clone();
        store.sell_item(&item_id, Some(date(2026, 1, 1))).unwrap();
        (store, account_id, item_id)
    }

    #[tokio::test]
    async fn test_sold_item_round_trip_includes_sale() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (store, account_id, item_id) = sold_store();

        db.accounts()
            .save(store.get_account(&account_id).unwrap())
            .await
            .unwrap();
        db.items()
            .save(store.get_item(&item_id).unwrap())
            .await
            .unwrap();

        let loaded = db.items().get(&item_id).await.unwrap().unwrap();
        assert_eq!(&loaded, store.get_item(&item_id).unwrap());

        let sale = loaded.sale_record.unwrap();
        assert_eq!(sale.account_share.cents(), 5880);
    }

    #[tokio::test]
    async fn test_load_all_attaches_sales() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (store, account_id, _) = sold_store();

        db.accounts()
            .save(store.get_account(&account_id).unwrap())
            .await
            .unwrap();
        for item in store.items() {
            db.items().save(item).await.unwrap();
        }

        let items = db.items().load_all().await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].sale_record.is_some());
    }
}
