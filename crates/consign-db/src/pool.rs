//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  App Startup                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repositories share the pool; register transactions where needed       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled for:
//! - Better concurrent read performance
//! - Readers don't block writers
//! - Writers don't block readers
//! - Better crash recovery

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use consign_core::{ConsignmentStore, Money, SplitPercent, DEFAULT_SPLIT, DEFAULT_STOCKING_FEE};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::account::AccountRepository;
use crate::repository::config::ConfigRepository;
use crate::repository::item::ItemRepository;
use crate::repository::payout::PayoutRepository;
use crate::repository::sync::SyncRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/consign.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for a single-register store)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The database file will be created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let config = DbConfig::in_memory();
    /// let db = Database::new(config).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// Cloning is cheap: the pool is internally reference-counted and all
/// repositories share it.
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,

    /// The configured database path (":memory:" for in-memory).
    /// Used by the sync engine to derive a stable instance identity.
    path: PathBuf,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite for a local store workload:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_options = if config.is_in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            // sqlite://path?mode=rwc creates the file if not exists
            let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
            SqliteConnectOptions::from_str(&connect_url)
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                // WAL mode: readers don't block writers and vice versa
                .journal_mode(SqliteJournalMode::Wal)
                // NORMAL synchronous: safe from corruption, may lose the
                // last transaction on power failure
                .synchronous(SqliteSynchronous::Normal)
                .create_if_missing(true)
        }
        // SQLite ships with foreign keys off for backwards compatibility
        .foreign_keys(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database {
            pool,
            path: config.database_path.clone(),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Idempotent.
    ///
    /// Automatically called by `new()` unless disabled in the config.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    ///
    /// For advanced queries not covered by repositories. Prefer
    /// repository methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The configured database path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Returns the account repository.
    pub fn accounts(&self) -> AccountRepository {
        AccountRepository::new(self.pool.clone())
    }

    /// Returns the item repository.
    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.pool.clone())
    }

    /// Returns the payout repository.
    pub fn payouts(&self) -> PayoutRepository {
        PayoutRepository::new(self.pool.clone())
    }

    /// Returns the store configuration repository.
    pub fn config(&self) -> ConfigRepository {
        ConfigRepository::new(self.pool.clone())
    }

    /// Returns the sync repository (dirty tracking + journal).
    pub fn sync(&self) -> SyncRepository {
        SyncRepository::new(self.pool.clone())
    }

    // =========================================================================
    // Whole-Store Orchestration
    // =========================================================================

    /// Loads the entire store state from disk.
    ///
    /// Reads the default terms from `store_config` (falling back to the
    /// built-in defaults for a fresh database) and every account, item,
    /// and payout. ID counters are rebuilt from the loaded data.
    pub async fn load_store(&self) -> DbResult<ConsignmentStore> {
        let config = self.config();
        let default_split = match config.get_int(ConfigRepository::KEY_DEFAULT_SPLIT_BPS).await? {
            Some(bps) if bps >= 0 => SplitPercent::from_bps(bps as u32),
            Some(bps) => {
                return Err(DbError::corrupt(
                    "store_config",
                    format!("negative default split {}", bps),
                ))
            }
            None => DEFAULT_SPLIT,
        };
        let default_fee = match config
            .get_int(ConfigRepository::KEY_DEFAULT_STOCKING_FEE_CENTS)
            .await?
        {
            Some(cents) => Money::from_cents(cents),
            None => DEFAULT_STOCKING_FEE,
        };

        let accounts = self.accounts().load_all().await?;
        let items = self.items().load_all().await?;
        let payouts = self.payouts().load_all().await?;

        info!(
            accounts = accounts.len(),
            items = items.len(),
            payouts = payouts.len(),
            "Store state loaded"
        );

        Ok(ConsignmentStore::from_parts(
            default_split,
            default_fee,
            accounts,
            items,
            payouts,
        ))
    }

    /// Persists the entire store state.
    ///
    /// Every row is written through the repositories, so everything
    /// touched is stamped dirty for the next sync. Used for explicit
    /// full saves; day-to-day writes go through individual repository
    /// calls.
    pub async fn save_store(&self, store: &ConsignmentStore) -> DbResult<()> {
        let config = self.config();
        config
            .set_int(
                ConfigRepository::KEY_DEFAULT_SPLIT_BPS,
                store.default_split().bps() as i64,
            )
            .await?;
        config
            .set_int(
                ConfigRepository::KEY_DEFAULT_STOCKING_FEE_CENTS,
                store.default_stocking_fee().cents(),
            )
            .await?;

        let accounts = self.accounts();
        for account in store.accounts() {
            accounts.save(account).await?;
        }
        let items = self.items();
        for item in store.items() {
            items.save(item).await?;
        }
        let payouts = self.payouts();
        for payout in store.payouts() {
            payouts.save(payout).await?;
        }

        debug!("Store state saved");
        Ok(())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
