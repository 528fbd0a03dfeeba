//! # Payout Repository
//!
//! CRUD for `payouts` rows. Payouts are append-mostly: written once when
//! issued, updated only if a check number is filled in later.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use consign_core::Payout;

use crate::error::DbResult;
use crate::rows::{PayoutRow, SYNC_PENDING};

/// Repository for payout operations.
#[derive(Debug, Clone)]
pub struct PayoutRepository {
    pool: SqlitePool,
}

impl PayoutRepository {
    /// Creates a new PayoutRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PayoutRepository { pool }
    }

    /// Inserts or updates a payout, marking the row dirty.
    pub async fn save(&self, payout: &Payout) -> DbResult<()> {
        let row = PayoutRow::from_domain(payout);
        let now = Utc::now().to_rfc3339();

        debug!(payout_id = %row.payout_id, "Saving payout");

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
        .bind(&now)
        .bind(SYNC_PENDING)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Loads every payout, in ID order (creation order).
    pub async fn load_all(&self) -> DbResult<Vec<Payout>> {
        let rows = sqlx::query_as::<_, PayoutRow>("SELECT * FROM payouts ORDER BY payout_id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(PayoutRow::into_domain).collect()
    }

    /// Loads payouts for one account, in ID order.
    pub async fn for_account(&self, account_id: &str) -> DbResult<Vec<Payout>> {
        let rows = sqlx::query_as::<_, PayoutRow>(
            "SELECT * FROM payouts WHERE account_id = ?1 ORDER BY payout_id",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PayoutRow::into_domain).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use consign_core::Money;

    use crate::pool::{Database, DbConfig};

    use super::*;

    fn sample_payout(id: &str, account_id: &str) -> Payout {
        Payout {
            payout_id: id.to_string(),
            account_id: account_id.to_string(),
            payout_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            amount: Money::from_cents(5880),
            check_number: Some("1042".to_string()),
        }
    }

    async fn db_with_account(account_id: &str) -> Database {
        use consign_core::{Account, Address, SplitPercent};

        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.accounts()
            .save(&Account {
                account_id: account_id.to_string(),
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
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_save_and_load_all() {
        let db = db_with_account("A1001").await;
        let repo = db.payouts();

        repo.save(&sample_payout("P000001", "A1001")).await.unwrap();
        repo.save(&sample_payout("P000002", "A1001")).await.unwrap();

        let all = repo.load_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].payout_id, "P000001");
        assert_eq!(all[0].check_number.as_deref(), Some("1042"));
    }

    #[tokio::test]
    async fn test_for_account_filters() {
        let db = db_with_account("A1001").await;
        let repo = db.payouts();
        repo.save(&sample_payout("P000001", "A1001")).await.unwrap();

        assert_eq!(repo.for_account("A1001").await.unwrap().len(), 1);
        assert!(repo.for_account("A9999").await.unwrap().is_empty());
    }
}
