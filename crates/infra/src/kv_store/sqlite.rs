//! SQLite-backed key-value store for on-device persistence.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use super::r#trait::{KeyValueStore, StorageError};

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// SQLite-backed key-value store.
///
/// One row per key in `key_value_store`; `set` upserts the full value.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Connect to `url` (e.g. `sqlite://cart.db` or `sqlite::memory:`) and
    /// create the table if needed.
    ///
    /// The pool holds a single long-lived connection: there is exactly one
    /// writer, and `sqlite::memory:` databases live only as long as their
    /// connection.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Open the store at `{app_data_dir}/gomarketplace/storage.db`.
    pub async fn open_default() -> anyhow::Result<Self> {
        let db_path = default_database_path()
            .context("failed to determine storage DB path - ensure app data directory is accessible")?;
        Self::open_at(&db_path).await
    }

    /// Open (creating if needed) the database file at `db_path`.
    pub async fn open_at(db_path: &Path) -> anyhow::Result<Self> {
        let db_url = format!("sqlite://{}", db_path.to_string_lossy());
        tracing::debug!(path = %db_path.display(), "opening key-value store");

        Self::connect(&db_url)
            .await
            .with_context(|| format!("failed to open SQLite key-value store at {db_path:?}"))
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS key_value_store (
                key        TEXT PRIMARY KEY NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT value
            FROM key_value_store
            WHERE key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO key_value_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key)
            DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Resolve the path to the SQLite database:
/// `{app_data_dir}/gomarketplace/storage.db`.
///
/// Creates the parent directory if it does not exist yet.
pub fn default_database_path() -> anyhow::Result<PathBuf> {
    let base = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .context("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")?;

    database_path_in(base)
}

/// `{base}/gomarketplace/storage.db`, creating the `gomarketplace` directory.
pub fn database_path_in(base: impl Into<PathBuf>) -> anyhow::Result<PathBuf> {
    let mut dir = base.into();
    dir.push("gomarketplace");

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create storage directory at {dir:?}"))?;

    dir.push("storage.db");
    Ok(dir)
}
