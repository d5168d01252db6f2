//! SQLite engine: one table per bucket

use super::{Bucket, KvStore};
use crate::error::{BrokerError, BrokerResult};
use crate::storage_error;
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Row, SqlitePool,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Durable store on a SQLite database.
///
/// WAL journaling gives a single writer with concurrent snapshot readers, and
/// every operation is its own transaction.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and make sure every
    /// bucket exists. `:memory:` opens a private in-memory database.
    pub async fn open(path: &str) -> BrokerResult<Self> {
        let pool = if path == ":memory:" {
            debug!("Opening in-memory SQLite store");
            // every connection to :memory: is a separate database
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    info!("Creating database directory: {}", parent.display());
                    std::fs::create_dir_all(parent)?;
                }
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5));

            SqlitePoolOptions::new().connect_with(options).await?
        };

        let store = Self { pool };
        store.create_buckets().await?;

        info!("Opened SQLite store at {}", path);
        Ok(store)
    }

    async fn create_buckets(&self) -> BrokerResult<()> {
        let mut tx = self.pool.begin().await?;
        for bucket in Bucket::ALL {
            let sql = format!(
                "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY NOT NULL, value BLOB NOT NULL) WITHOUT ROWID",
                bucket.as_str()
            );
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_error!(format!("create bucket {}: {}", bucket, e), "create_bucket", e))?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, bucket: Bucket, key: &str) -> BrokerResult<Option<Vec<u8>>> {
        let sql = format!("SELECT value FROM {} WHERE key = ?", bucket.as_str());
        let row = sqlx::query(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error!(e.to_string(), "get", e))?;

        match row {
            Some(row) => Ok(Some(row.try_get::<Vec<u8>, _>("value")?)),
            None => Ok(None),
        }
    }

    async fn put(&self, bucket: Bucket, key: &str, value: Vec<u8>) -> BrokerResult<()> {
        let sql = format!(
            "INSERT INTO {} (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            bucket.as_str()
        );
        sqlx::query(&sql)
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!(e.to_string(), "put", e))?;
        Ok(())
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> BrokerResult<()> {
        let sql = format!("DELETE FROM {} WHERE key = ?", bucket.as_str());
        sqlx::query(&sql)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error!(e.to_string(), "delete", e))?;
        Ok(())
    }

    async fn list(&self, bucket: Bucket) -> BrokerResult<Vec<Vec<u8>>> {
        // TEXT keys compare with the BINARY collation, i.e. byte order
        let sql = format!("SELECT value FROM {} ORDER BY key", bucket.as_str());
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error!(e.to_string(), "list", e))?;

        rows.iter()
            .map(|row| row.try_get::<Vec<u8>, _>("value").map_err(BrokerError::from))
            .collect()
    }

    async fn clear(&self, bucket: Bucket) -> BrokerResult<()> {
        let sql = format!("DELETE FROM {}", bucket.as_str());
        let mut tx = self.pool.begin().await?;
        sqlx::query(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error!(e.to_string(), "clear", e))?;
        tx.commit().await?;
        Ok(())
    }
}
