//! # Consignment Store Aggregate
//!
//! The in-memory aggregate owning all accounts, items, and payouts, and
//! the lifecycle state machine that mutates them.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Item State Machine                              │
//! │                                                                     │
//! │                 ┌──────── sell_item ────────► SOLD                  │
//! │                 │        (credits account balance)                  │
//! │                 │                                                   │
//! │    ACTIVE ──────┼──────── return_item ──────► RETURNED              │
//! │                 │                                                   │
//! │                 └──────── expire_item ──────► EXPIRED               │
//! │                          process_expirations (batch, age >= 120)    │
//! │                                                                     │
//! │    SOLD / RETURNED / EXPIRED are terminal: every further            │
//! │    transition fails with InvalidItemState.                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! IDs are store-local monotonic counters rendered with a fixed prefix:
//! accounts `A1001..`, items `I000001..`, payouts `P000001..`. After a
//! reload the counters are recovered by scanning the persisted IDs for
//! the highest numeric suffix (see [`ConsignmentStore::from_parts`]),
//! so counter state is always derivable purely from data.

use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, SplitPercent};
use crate::pricing::{self, EXPIRY_DAYS};
use crate::types::{Account, Address, Item, ItemStatus, Payout, SaleRecord};
use crate::validation;

// =============================================================================
// Defaults
// =============================================================================

/// Default account share of post-fee proceeds: 60%.
pub const DEFAULT_SPLIT: SplitPercent = SplitPercent::from_percent(60);

/// Default flat stocking fee per item sold: $2.00.
pub const DEFAULT_STOCKING_FEE: Money = Money::from_cents(200);

/// Default account type for new accounts.
pub const DEFAULT_ACCOUNT_TYPE: &str = "consignment";

/// First account counter value (IDs start at A1001).
const FIRST_ACCOUNT_NUMBER: u32 = 1001;

// =============================================================================
// Input Structs
// =============================================================================

/// Fields for registering a new account. `None` terms fall back to the
/// store defaults.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub address: Address,
    pub account_type: Option<String>,
    pub split_percent: Option<SplitPercent>,
    pub stocking_fee: Option<Money>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Fields for taking in a new item. `None` entry date means today.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub entry_date: Option<NaiveDate>,
}

/// Inventory counts by lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InventorySummary {
    pub active: usize,
    pub sold: usize,
    pub returned: usize,
    pub expired: usize,
}

impl InventorySummary {
    pub fn total(&self) -> usize {
        self.active + self.sold + self.returned + self.expired
    }
}

// =============================================================================
// Consignment Store
// =============================================================================

/// Main consignment store aggregate.
///
/// Exclusively owns all entity instances in memory; the durable store
/// materializes rows on demand and never holds long-lived references.
#[derive(Debug, Clone)]
pub struct ConsignmentStore {
    default_split: SplitPercent,
    default_stocking_fee: Money,

    accounts: BTreeMap<String, Account>,
    items: BTreeMap<String, Item>,
    payouts: Vec<Payout>,

    next_account: u32,
    next_item: u32,
    next_payout: u32,
}

impl Default for ConsignmentStore {
    fn default() -> Self {
        Self::new(DEFAULT_SPLIT, DEFAULT_STOCKING_FEE)
    }
}

impl ConsignmentStore {
    /// Creates an empty store with the given default commission terms.
    pub fn new(default_split: SplitPercent, default_stocking_fee: Money) -> Self {
        ConsignmentStore {
            default_split,
            default_stocking_fee,
            accounts: BTreeMap::new(),
            items: BTreeMap::new(),
            payouts: Vec::new(),
            next_account: FIRST_ACCOUNT_NUMBER,
            next_item: 1,
            next_payout: 1,
        }
    }

    /// Reassembles a store from persisted data, recovering the ID
    /// counters from the highest numeric suffix seen per entity kind.
    ///
    /// The counters are data-derived on purpose: a lost or stale counter
    /// row can never cause a duplicate ID after recovery.
    pub fn from_parts(
        default_split: SplitPercent,
        default_stocking_fee: Money,
        accounts: Vec<Account>,
        items: Vec<Item>,
        payouts: Vec<Payout>,
    ) -> Self {
        let next_account = accounts
            .iter()
            .filter_map(|a| id_suffix(&a.account_id))
            .max()
            .map(|n| n + 1)
            .unwrap_or(FIRST_ACCOUNT_NUMBER)
            .max(FIRST_ACCOUNT_NUMBER);
        let next_item = items
            .iter()
            .filter_map(|i| id_suffix(&i.item_id))
            .max()
            .map(|n| n + 1)
            .unwrap_or(1);
        let next_payout = payouts
            .iter()
            .filter_map(|p| id_suffix(&p.payout_id))
            .max()
            .map(|n| n + 1)
            .unwrap_or(1);

        ConsignmentStore {
            default_split,
            default_stocking_fee,
            accounts: accounts
                .into_iter()
                .map(|a| (a.account_id.clone(), a))
                .collect(),
            items: items.into_iter().map(|i| (i.item_id.clone(), i)).collect(),
            payouts,
            next_account,
            next_item,
            next_payout,
        }
    }

    /// Default split for new accounts.
    pub fn default_split(&self) -> SplitPercent {
        self.default_split
    }

    /// Default stocking fee for new accounts.
    pub fn default_stocking_fee(&self) -> Money {
        self.default_stocking_fee
    }

    // =========================================================================
    // Account Management
    // =========================================================================

    /// Registers a new account with the store.
    pub fn add_account(&mut self, new: NewAccount) -> CoreResult<&Account> {
        validation::validate_name("first_name", &new.first_name)?;
        validation::validate_name("last_name", &new.last_name)?;
        if let Some(fee) = new.stocking_fee {
            validation::validate_price("stocking_fee", fee)?;
        }

        let account_id = format!("A{}", self.next_account);
        self.next_account += 1;

        let account = Account {
            account_id: account_id.clone(),
            first_name: new.first_name,
            last_name: new.last_name,
            address: new.address,
            account_type: new
                .account_type
                .unwrap_or_else(|| DEFAULT_ACCOUNT_TYPE.to_string()),
            split_percent: new.split_percent.unwrap_or(self.default_split),
            stocking_fee: new.stocking_fee.unwrap_or(self.default_stocking_fee),
            balance: Money::zero(),
            phone: new.phone,
            email: new.email,
            created_date: Utc::now().date_naive(),
        };

        Ok(self.accounts.entry(account_id).or_insert(account))
    }

    /// Retrieves an account by ID.
    pub fn get_account(&self, account_id: &str) -> Option<&Account> {
        self.accounts.get(account_id)
    }

    /// Updates an account's commission terms. `None` leaves a term unchanged.
    pub fn update_account_terms(
        &mut self,
        account_id: &str,
        split_percent: Option<SplitPercent>,
        stocking_fee: Option<Money>,
    ) -> CoreResult<&Account> {
        let account = self
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;

        if let Some(split) = split_percent {
            account.split_percent = split;
        }
        if let Some(fee) = stocking_fee {
            account.stocking_fee = fee;
        }

        Ok(account)
    }

    /// All accounts, sorted by last name (case-insensitive).
    pub fn list_accounts(&self) -> Vec<&Account> {
        let mut accounts: Vec<&Account> = self.accounts.values().collect();
        accounts.sort_by_key(|a| a.last_name.to_lowercase());
        accounts
    }

    /// Iterates all accounts in ID order (for persistence).
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    // =========================================================================
    // Item Management
    // =========================================================================

    /// Adds a new item to consignment inventory.
    pub fn add_item(&mut self, account_id: &str, new: NewItem) -> CoreResult<&Item> {
        if !self.accounts.contains_key(account_id) {
            return Err(CoreError::AccountNotFound(account_id.to_string()));
        }
        validation::validate_name("name", &new.name)?;
        validation::validate_description(&new.description)?;
        validation::validate_price("price", new.price)?;

        let item_id = format!("I{:06}", self.next_item);
        self.next_item += 1;

        let entry_date = new.entry_date.unwrap_or_else(|| Utc::now().date_naive());
        let item = Item {
            item_id: item_id.clone(),
            account_id: account_id.to_string(),
            name: new.name,
            description: new.description,
            original_price: new.price,
            entry_date,
            status: ItemStatus::Active,
            status_date: entry_date,
            sale_record: None,
        };

        Ok(self.items.entry(item_id).or_insert(item))
    }

    /// Retrieves an item by ID.
    pub fn get_item(&self, item_id: &str) -> Option<&Item> {
        self.items.get(item_id)
    }

    /// All items for an account, optionally filtered by status.
    pub fn items_for_account(&self, account_id: &str, status: Option<ItemStatus>) -> Vec<&Item> {
        self.items
            .values()
            .filter(|i| i.account_id == account_id)
            .filter(|i| status.map_or(true, |s| i.status == s))
            .collect()
    }

    /// All active (unsold, unreturned, unexpired) items.
    pub fn active_items(&self) -> Vec<&Item> {
        self.items
            .values()
            .filter(|i| i.status == ItemStatus::Active)
            .collect()
    }

    /// Active items that will reach the 120-day threshold within
    /// `within_days` days of `as_of`.
    pub fn expiring_items(&self, within_days: i64, as_of: NaiveDate) -> Vec<&Item> {
        let cutoff = EXPIRY_DAYS - within_days;
        self.items
            .values()
            .filter(|i| i.status == ItemStatus::Active)
            .filter(|i| {
                let age = i.days_since_entry(as_of);
                age >= cutoff && age < EXPIRY_DAYS
            })
            .collect()
    }

    /// Iterates all items in ID order (for persistence).
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    // =========================================================================
    // Sales
    // =========================================================================

    /// Processes the sale of an item.
    ///
    /// Computes the discount, sale price, and split as of the sale date
    /// (default today), stamps the item Sold with the resulting
    /// [`SaleRecord`], and credits the owning account's balance by the
    /// account share. Both mutations happen together or not at all: the
    /// item is only stamped after the account lookup has succeeded.
    pub fn sell_item(
        &mut self,
        item_id: &str,
        sale_date: Option<NaiveDate>,
    ) -> CoreResult<SaleRecord> {
        let item = self
            .items
            .get(item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        if item.status != ItemStatus::Active {
            return Err(CoreError::InvalidItemState {
                item_id: item_id.to_string(),
                status: item.status,
            });
        }

        let sale_date = sale_date.unwrap_or_else(|| Utc::now().date_naive());
        let account = self
            .accounts
            .get(&item.account_id)
            .ok_or_else(|| CoreError::AccountNotFound(item.account_id.clone()))?;

        let discount = item.discount_percent(sale_date);
        let sale_price = item.current_price(sale_date);
        let split = pricing::compute_split(sale_price, account.stocking_fee, account.split_percent);

        let sale_record = SaleRecord {
            item_id: item_id.to_string(),
            sale_date,
            original_price: item.original_price,
            sale_price,
            discount_percent: discount,
            stocking_fee: account.stocking_fee,
            account_share: split.account_share,
            store_share: split.store_share,
        };

        // Two-entity mutation: item stamped Sold and balance credited in
        // the same critical section.
        let account_id = item.account_id.clone();
        let item = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        item.status = ItemStatus::Sold;
        item.status_date = sale_date;
        item.sale_record = Some(sale_record.clone());

        let account = self
            .accounts
            .get_mut(&account_id)
            .ok_or_else(|| CoreError::AccountNotFound(account_id.clone()))?;
        account.balance += sale_record.account_share;

        Ok(sale_record)
    }

    /// Marks an item as returned to / picked up by the account.
    /// No monetary effect.
    pub fn return_item(&mut self, item_id: &str, return_date: Option<NaiveDate>) -> CoreResult<&Item> {
        self.transition(item_id, ItemStatus::Returned, return_date)
    }

    /// Marks an item as expired (store property).
    pub fn expire_item(&mut self, item_id: &str, expire_date: Option<NaiveDate>) -> CoreResult<&Item> {
        self.transition(item_id, ItemStatus::Expired, expire_date)
    }

    fn transition(
        &mut self,
        item_id: &str,
        to: ItemStatus,
        date: Option<NaiveDate>,
    ) -> CoreResult<&Item> {
        let item = self
            .items
            .get_mut(item_id)
            .ok_or_else(|| CoreError::ItemNotFound(item_id.to_string()))?;
        if item.status != ItemStatus::Active {
            return Err(CoreError::InvalidItemState {
                item_id: item_id.to_string(),
                status: item.status,
            });
        }

        item.status = to;
        item.status_date = date.unwrap_or_else(|| Utc::now().date_naive());
        Ok(item)
    }

    /// Batch sweep: transitions every Active item aged 120 days or more
    /// to Expired and returns the newly expired set.
    ///
    /// This is invoked periodically (or on demand), never from a single
    /// item access.
    pub fn process_expirations(&mut self, as_of: NaiveDate) -> Vec<Item> {
        let mut expired = Vec::new();

        for item in self.items.values_mut() {
            if item.status == ItemStatus::Active && pricing::is_expired(item.entry_date, as_of) {
                item.status = ItemStatus::Expired;
                item.status_date = as_of;
                expired.push(item.clone());
            }
        }

        expired
    }

    // =========================================================================
    // Payouts
    // =========================================================================

    /// Pays out an account's full balance.
    ///
    /// Returns `Ok(None)` when the balance is zero (an expected state,
    /// not an error). Creating the payout and zeroing the balance are
    /// one logical operation.
    pub fn process_payout(
        &mut self,
        account_id: &str,
        check_number: Option<String>,
        payout_date: Option<NaiveDate>,
    ) -> CoreResult<Option<Payout>> {
        let account = self
            .accounts
            .get_mut(account_id)
            .ok_or_else(|| CoreError::AccountNotFound(account_id.to_string()))?;

        if !account.balance.is_positive() {
            return Ok(None);
        }

        let payout_id = format!("P{:06}", self.next_payout);
        self.next_payout += 1;

        let payout = Payout {
            payout_id,
            account_id: account_id.to_string(),
            payout_date: payout_date.unwrap_or_else(|| Utc::now().date_naive()),
            amount: account.balance,
            check_number,
        };

        account.balance = Money::zero();
        self.payouts.push(payout.clone());

        Ok(Some(payout))
    }

    /// Payout history, optionally filtered by account.
    pub fn payout_history(&self, account_id: Option<&str>) -> Vec<&Payout> {
        self.payouts
            .iter()
            .filter(|p| account_id.map_or(true, |id| p.account_id == id))
            .collect()
    }

    /// Iterates all payouts in creation order (for persistence).
    pub fn payouts(&self) -> impl Iterator<Item = &Payout> {
        self.payouts.iter()
    }

    // =========================================================================
    // Reporting
    // =========================================================================

    /// All sale records for an account.
    pub fn sales_for_account(&self, account_id: &str) -> Vec<&SaleRecord> {
        self.items
            .values()
            .filter(|i| i.account_id == account_id)
            .filter_map(|i| i.sale_record.as_ref())
            .collect()
    }

    /// Summary counts of inventory by status.
    pub fn inventory_summary(&self) -> InventorySummary {
        let mut summary = InventorySummary::default();
        for item in self.items.values() {
            match item.status {
                ItemStatus::Active => summary.active += 1,
                ItemStatus::Sold => summary.sold += 1,
                ItemStatus::Returned => summary.returned += 1,
                ItemStatus::Expired => summary.expired += 1,
            }
        }
        summary
    }
}

/// Numeric suffix of a prefixed business ID ("I000042" -> 42).
fn id_suffix(id: &str) -> Option<u32> {
    id.get(1..).and_then(|s| s.parse().ok())
}

// =============================================================================
// Unit Tests
// =============================================================================
