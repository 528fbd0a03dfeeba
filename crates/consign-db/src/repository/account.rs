//! # Account Repository
//!
//! CRUD for `accounts` rows.
//!
//! Every write is an upsert that restamps `modified_at` and resets
//! `sync_status` to `'pending'`, so any local change automatically joins
//! the next push.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use consign_core::Account;

use crate::error::DbResult;
use crate::rows::{AccountRow, SYNC_PENDING};

/// Repository for account operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: SqlitePool,
}

impl AccountRepository {
    /// Creates a new AccountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AccountRepository { pool }
    }

    /// Inserts or updates an account, marking the row dirty.
    pub async fn save(&self, account: &Account) -> DbResult<()> {
        let row = AccountRow::from_domain(account);
        let now = Utc::now().to_rfc3339();

        debug!(account_id = %row.account_id, "Saving account");

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
        .bind(&now)
        .bind(SYNC_PENDING)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetches a single account by ID.
    pub async fn get(&self, account_id: &str) -> DbResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts WHERE account_id = ?1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AccountRow::into_domain).transpose()
    }

    /// Loads every account, in ID order.
    pub async fn load_all(&self) -> DbResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT * FROM accounts ORDER BY account_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AccountRow::into_domain).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use consign_core::{Address, Money, SplitPercent};

    use crate::pool::{Database, DbConfig};

    use super::*;

    fn sample_account(id: &str) -> Account {
        Account {
            account_id: id.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            address: Address {
                street: "1 Elm".to_string(),
                city: "Ames".to_string(),
                state: "IA".to_string(),
                zip_code: "50010".to_string(),
            },
            account_type: "consignment".to_string(),
            split_percent: SplitPercent::from_percent(60),
            stocking_fee: Money::from_cents(200),
            balance: Money::zero(),
            phone: Some("555-0100".to_string()),
            email: None,
            created_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_save_and_get_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accounts();

        let account = sample_account("A1001");
        repo.save(&account).await.unwrap();

        let loaded = repo.get("A1001").await.unwrap().unwrap();
        assert_eq!(loaded, account);

        assert!(repo.get("A9999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.accounts();

        let mut account = sample_account("A1001");
        repo.save(&account).await.unwrap();

        account.balance = Money::from_cents(5880);
        repo.save(&account).await.unwrap();

        let all = repo.load_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].balance, Money::from_cents(5880));
    }
}
