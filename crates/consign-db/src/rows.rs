//! # Row Types
//!
//! Typed mirror of the SQLite schema. Every persisted table has a row
//! struct here with `sqlx::FromRow` for reads and `serde` derives so the
//! sync engine can carry whole rows across the wire.
//!
//! ## Conventions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Column            Rust field          Domain value                     │
//! │  ────────────      ─────────────       ─────────────────────────        │
//! │  *_cents INTEGER   i64                 Money                            │
//! │  split_bps INTEGER i64                 SplitPercent                     │
//! │  dates TEXT        String (ISO-8601)   chrono::NaiveDate                │
//! │  status TEXT       String              ItemStatus                       │
//! │                                                                         │
//! │  modified_at + sync_status ride along on every business row so the     │
//! │  sync engine can select dirty rows without joining anything.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row -> domain conversions are fallible: a bad status string or
//! unparseable date surfaces as [`DbError::CorruptRow`] instead of a panic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use consign_core::{Account, Address, Item, ItemStatus, Money, Payout, SaleRecord, SplitPercent};

use crate::error::{DbError, DbResult};

/// Date format used for all date columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sync status value for rows with unpushed local changes.
pub const SYNC_PENDING: &str = "pending";

/// Sync status value for rows the cloud has seen.
pub const SYNC_SYNCED: &str = "synced";

fn parse_date(table: &str, value: &str) -> DbResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| DbError::corrupt(table, format!("bad date '{}': {}", value, e)))
}

// =============================================================================
// Config
// =============================================================================

/// One `store_config` key/value row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ConfigRow {
    pub key: String,
    pub value: String,
    pub modified_at: String,
    pub sync_status: String,
}

// =============================================================================
// Accounts
// =============================================================================

/// One `accounts` row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AccountRow {
    pub account_id: String,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub account_type: String,
    pub split_bps: i64,
    pub stocking_fee_cents: i64,
    pub balance_cents: i64,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_date: String,
    pub modified_at: String,
    pub sync_status: String,
}

impl AccountRow {
    /// Flattens a domain account into column values. The sync columns
    /// are stamped by the repository at write time, not here.
    pub fn from_domain(account: &Account) -> Self {
        AccountRow {
            account_id: account.account_id.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            street: account.address.street.clone(),
            city: account.address.city.clone(),
            state: account.address.state.clone(),
            zip_code: account.address.zip_code.clone(),
            account_type: account.account_type.clone(),
            split_bps: account.split_percent.bps() as i64,
            stocking_fee_cents: account.stocking_fee.cents(),
            balance_cents: account.balance.cents(),
            phone: account.phone.clone(),
            email: account.email.clone(),
            created_date: account.created_date.format(DATE_FORMAT).to_string(),
            modified_at: String::new(),
            sync_status: String::new(),
        }
    }

    pub fn into_domain(self) -> DbResult<Account> {
        if self.split_bps < 0 {
            return Err(DbError::corrupt(
                "accounts",
                format!("negative split_bps {}", self.split_bps),
            ));
        }
        Ok(Account {
            account_id: self.account_id,
            first_name: self.first_name,
            last_name: self.last_name,
            address: Address {
                street: self.street,
                city: self.city,
                state: self.state,
                zip_code: self.zip_code,
            },
            account_type: self.account_type,
            split_percent: SplitPercent::from_bps(self.split_bps as u32),
            stocking_fee: Money::from_cents(self.stocking_fee_cents),
            balance: Money::from_cents(self.balance_cents),
            phone: self.phone,
            email: self.email,
            created_date: parse_date("accounts", &self.created_date)?,
        })
    }
}

// =============================================================================
// Items
// =============================================================================

/// One `items` row. The sale record lives in its own table; see
/// [`SaleRow`] and [`ItemRow::into_domain`].
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ItemRow {
    pub item_id: String,
    pub account_id: String,
    pub name: String,
    pub description: String,
    pub original_price_cents: i64,
    pub entry_date: String,
    pub status: String,
    pub status_date: String,
    pub modified_at: String,
    pub sync_status: String,
}

impl ItemRow {
    pub fn from_domain(item: &Item) -> Self {
        ItemRow {
            item_id: item.item_id.clone(),
            account_id: item.account_id.clone(),
            name: item.name.clone(),
            description: item.description.clone(),
            original_price_cents: item.original_price.cents(),
            entry_date: item.entry_date.format(DATE_FORMAT).to_string(),
            status: item.status.as_str().to_string(),
            status_date: item.status_date.format(DATE_FORMAT).to_string(),
            modified_at: String::new(),
            sync_status: String::new(),
        }
    }

    /// Rehydrates the item, attaching its sale record when one exists.
    pub fn into_domain(self, sale: Option<SaleRow>) -> DbResult<Item> {
        let status: ItemStatus = self
            .status
            .parse()
            .map_err(|e: String| DbError::corrupt("items", e))?;

        Ok(Item {
            item_id: self.item_id,
            account_id: self.account_id,
            name: self.name,
            description: self.description,
            original_price: Money::from_cents(self.original_price_cents),
            entry_date: parse_date("items", &self.entry_date)?,
            status,
            status_date: parse_date("items", &self.status_date)?,
            sale_record: sale.map(SaleRow::into_domain).transpose()?,
        })
    }
}

// =============================================================================
// Sales
// =============================================================================

/// One `sales` row. Keyed by `item_id` (an item sells at most once);
/// `account_id` is denormalized for per-account reporting queries.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SaleRow {
    pub item_id: String,
    pub account_id: String,
    pub sale_date: String,
    pub original_price_cents: i64,
    pub sale_price_cents: i64,
    pub discount_percent: i64,
    pub stocking_fee_cents: i64,
    pub account_share_cents: i64,
    pub store_share_cents: i64,
    pub modified_at: String,
    pub sync_status: String,
}

impl SaleRow {
    pub fn from_domain(account_id: &str, sale: &SaleRecord) -> Self {
        SaleRow {
            item_id: sale.item_id.clone(),
            account_id: account_id.to_string(),
            sale_date: sale.sale_date.format(DATE_FORMAT).to_string(),
            original_price_cents: sale.original_price.cents(),
            sale_price_cents: sale.sale_price.cents(),
            discount_percent: sale.discount_percent as i64,
            stocking_fee_cents: sale.stocking_fee.cents(),
            account_share_cents: sale.account_share.cents(),
            store_share_cents: sale.store_share.cents(),
            modified_at: String::new(),
            sync_status: String::new(),
        }
    }

    pub fn into_domain(self) -> DbResult<SaleRecord> {
        let discount = u8::try_from(self.discount_percent).map_err(|_| {
            DbError::corrupt(
                "sales",
                format!("discount_percent {} out of range", self.discount_percent),
            )
        })?;

        Ok(SaleRecord {
            item_id: self.item_id,
            sale_date: parse_date("sales", &self.sale_date)?,
            original_price: Money::from_cents(self.original_price_cents),
            sale_price: Money::from_cents(self.sale_price_cents),
            discount_percent: discount,
            stocking_fee: Money::from_cents(self.stocking_fee_cents),
            account_share: Money::from_cents(self.account_share_cents),
            store_share: Money::from_cents(self.store_share_cents),
        })
    }
}

// =============================================================================
// Payouts
// =============================================================================

/// One `payouts` row.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PayoutRow {
    pub payout_id: String,
    pub account_id: String,
    pub payout_date: String,
    pub amount_cents: i64,
    pub check_number: Option<String>,
    pub modified_at: String,
    pub sync_status: String,
}

impl PayoutRow {
    pub fn from_domain(payout: &Payout) -> Self {
        PayoutRow {
            payout_id: payout.payout_id.clone(),
            account_id: payout.account_id.clone(),
            payout_date: payout.payout_date.format(DATE_FORMAT).to_string(),
            amount_cents: payout.amount.cents(),
            check_number: payout.check_number.clone(),
            modified_at: String::new(),
            sync_status: String::new(),
        }
    }

    pub fn into_domain(self) -> DbResult<Payout> {
        Ok(Payout {
            payout_id: self.payout_id,
            account_id: self.account_id,
            payout_date: parse_date("payouts", &self.payout_date)?,
            amount: Money::from_cents(self.amount_cents),
            check_number: self.check_number,
        })
    }
}

// =============================================================================
// Sync Journal
// =============================================================================

/// One `sync_log` row. Local-only, never pushed.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SyncLogRow {
    pub id: i64,
    pub sync_type: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub status: String,
    pub records_synced: i64,
    pub error_message: Option<String>,
}

// =============================================================================
// Change Set
// =============================================================================

/// Every dirty (sync_status = 'pending') row across all synced tables,
/// grouped by table. This is the unit of work for a push.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub config: Vec<ConfigRow>,
    pub accounts: Vec<AccountRow>,
    pub items: Vec<ItemRow>,
    pub sales: Vec<SaleRow>,
    pub payouts: Vec<PayoutRow>,
}

impl ChangeSet {
    /// Total number of rows across all tables.
    pub fn record_count(&self) -> u64 {
        (self.config.len()
            + self.accounts.len()
            + self.items.len()
            + self.sales.len()
            + self.payouts.len()) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_account() -> Account {
        Account {
            account_id: "A1001".to_string(),
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
            balance: Money::from_cents(5880),
            phone: None,
            email: Some("jane@example.com".to_string()),
            created_date: date(2026, 1, 15),
        }
    }

    #[test]
    fn test_account_row_round_trip() {
        let account = sample_account();
        let row = AccountRow::from_domain(&account);

        assert_eq!(row.split_bps, 6000);
        assert_eq!(row.created_date, "2026-01-15");

        let back = row.into_domain().unwrap();
        assert_eq!(back, account);
    }

    #[test]
    fn test_account_row_rejects_negative_split() {
        let mut row = AccountRow::from_domain(&sample_account());
        row.split_bps = -1;
        assert!(matches!(
            row.into_domain(),
            Err(DbError::CorruptRow { .. })
        ));
    }

    #[test]
    fn test_item_row_bad_status_is_corrupt() {
        let item = Item {
            item_id: "I000001".to_string(),
            account_id: "A1001".to_string(),
            name: "Lamp".to_string(),
            description: String::new(),
            original_price: Money::from_cents(4500),
            entry_date: date(2026, 1, 1),
            status: ItemStatus::Active,
            status_date: date(2026, 1, 1),
            sale_record: None,
        };
        let mut row = ItemRow::from_domain(&item);
        row.status = "vaporized".to_string();

        assert!(matches!(
            row.into_domain(None),
            Err(DbError::CorruptRow { .. })
        ));
    }

    #[test]
    fn test_item_row_with_sale_round_trip() {
        let sale = SaleRecord {
            item_id: "I000001".to_string(),
            sale_date: date(2026, 2, 5),
            original_price: Money::from_cents(10000),
            sale_price: Money::from_cents(7500),
            discount_percent: 25,
            stocking_fee: Money::from_cents(200),
            account_share: Money::from_cents(4380),
            store_share: Money::from_cents(3120),
        };
        let item = Item {
            item_id: "I000001".to_string(),
            account_id: "A1001".to_string(),
            name: "Chair".to_string(),
            description: String::new(),
            original_price: Money::from_cents(10000),
            entry_date: date(2026, 1, 1),
            status: ItemStatus::Sold,
            status_date: date(2026, 2, 5),
            sale_record: Some(sale.clone()),
        };

        let item_row = ItemRow::from_domain(&item);
        let sale_row = SaleRow::from_domain(&item.account_id, &sale);
        assert_eq!(sale_row.account_id, "A1001");

        let back = item_row.into_domain(Some(sale_row)).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_bad_date_is_corrupt() {
        let mut row = PayoutRow::from_domain(&Payout {
            payout_id: "P000001".to_string(),
            account_id: "A1001".to_string(),
            payout_date: date(2026, 3, 1),
            amount: Money::from_cents(5880),
            check_number: None,
        });
        row.payout_date = "not-a-date".to_string();

        assert!(matches!(
            row.into_domain(),
            Err(DbError::CorruptRow { .. })
        ));
    }

    #[test]
    fn test_change_set_counts() {
        let mut change_set = ChangeSet::default();
        assert!(change_set.is_empty());

        change_set.accounts.push(AccountRow::from_domain(&sample_account()));
        change_set.config.push(ConfigRow {
            key: "default_split_bps".to_string(),
            value: "6000".to_string(),
            modified_at: String::new(),
            sync_status: SYNC_PENDING.to_string(),
        });

        assert_eq!(change_set.record_count(), 2);
        assert!(!change_set.is_empty());
    }
}
