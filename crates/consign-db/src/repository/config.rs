//! # Store Configuration Repository
//!
//! Key/value store for store-level settings (`store_config` table).
//! Values are TEXT; typed accessors parse on the way out. Config rows
//! participate in sync dirty tracking like any other table.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::rows::{ConfigRow, SYNC_PENDING};

/// Repository for store configuration.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    pool: SqlitePool,
}

impl ConfigRepository {
    /// Default account split, stored in basis points.
    pub const KEY_DEFAULT_SPLIT_BPS: &'static str = "default_split_bps";

    /// Default stocking fee, stored in cents.
    pub const KEY_DEFAULT_STOCKING_FEE_CENTS: &'static str = "default_stocking_fee_cents";

    /// Creates a new ConfigRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConfigRepository { pool }
    }

    /// Sets a config value, marking the row dirty.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        let now = Utc::now().to_rfc3339();

        debug!(key = %key, "Setting config value");

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
        .bind(key)
        .bind(value)
        .bind(&now)
        .bind(SYNC_PENDING)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a config value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM store_config WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value)
    }

    /// Sets an integer config value.
    pub async fn set_int(&self, key: &str, value: i64) -> DbResult<()> {
        self.set(key, &value.to_string()).await
    }

    /// Gets an integer config value. A non-numeric stored value is a
    /// corrupt row, not a silent default.
    pub async fn get_int(&self, key: &str) -> DbResult<Option<i64>> {
        match self.get(key).await? {
            None => Ok(None),
            Some(text) => text
                .parse::<i64>()
                .map(Some)
                .map_err(|_| {
                    DbError::corrupt("store_config", format!("non-integer value for '{}'", key))
                }),
        }
    }

    /// Loads every config row (for sync and diagnostics).
    pub async fn load_all(&self) -> DbResult<Vec<ConfigRow>> {
        let rows = sqlx::query_as::<_, ConfigRow>("SELECT * FROM store_config ORDER BY key")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    use super::*;

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.config();

        assert!(repo.get("missing").await.unwrap().is_none());

        repo.set_int(ConfigRepository::KEY_DEFAULT_SPLIT_BPS, 6000)
            .await
            .unwrap();
        assert_eq!(
            repo.get_int(ConfigRepository::KEY_DEFAULT_SPLIT_BPS)
                .await
                .unwrap(),
            Some(6000)
        );

        // Overwrite sticks.
        repo.set_int(ConfigRepository::KEY_DEFAULT_SPLIT_BPS, 5500)
            .await
            .unwrap();
        assert_eq!(
            repo.get_int(ConfigRepository::KEY_DEFAULT_SPLIT_BPS)
                .await
                .unwrap(),
            Some(5500)
        );
    }

    #[tokio::test]
    async fn test_non_integer_value_is_corrupt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.config();

        repo.set("store_name", "Second Chance Consignment").await.unwrap();
        assert!(matches!(
            repo.get_int("store_name").await,
            Err(DbError::CorruptRow { .. })
        ));
    }
}
