#![cfg(feature = "sqlite")]

use crate::storage_traits::{key_in_range, KeyValue, StateIter, StateIterator, WorldState};
use anyhow::Context;
use energy_core::error::StorageError;
use energy_core::selector::Selector;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::runtime::Runtime;

/// Rows fetched per round trip while iterating
const DEFAULT_PAGE_SIZE: i64 = 256;

/// A SQLite-based world state using sqlx.
///
/// Keys are TEXT compared with the BINARY collation, so SQL ordering matches
/// the byte ordering every other backend uses.
pub struct SqliteWorldState {
    pool: SqlitePool,
    rt: Arc<Runtime>,
    db_path: PathBuf,
    page_size: i64,
}

impl SqliteWorldState {
    /// Opens (or creates) a SQLite world state at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db_path = path.as_ref().to_path_buf();
        let db_url = format!("sqlite:{}", db_path.to_string_lossy());

        // Create a runtime for async operations
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create runtime")?;
        let rt = Arc::new(rt);

        let options = SqliteConnectOptions::from_str(&db_url)
            .with_context(|| format!("Invalid database URL: {}", db_url))?
            .create_if_missing(true);

        let pool = rt
            .block_on(async {
                SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await
            })
            .with_context(|| format!("Failed to connect to database at {:?}", db_path))?;

        rt.block_on(Self::initialize_schema(&pool))
            .context("Failed to initialize database schema")?;

        log::debug!("Opened SQLite world state at {:?}", db_path);

        Ok(Self {
            pool,
            rt,
            db_path,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Override the number of rows fetched per page during scans
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Creates the necessary tables in the database
    async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS world_state (
                key TEXT PRIMARY KEY COLLATE BINARY,
                value BLOB NOT NULL
            )",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    fn iterator(&self, start_key: &str, end_key: &str, filter: Option<Selector>) -> StateIter<'_> {
        Box::new(SqliteStateIterator {
            pool: self.pool.clone(),
            rt: self.rt.clone(),
            start_key: start_key.to_string(),
            end_key: end_key.to_string(),
            last_key: None,
            filter,
            buffer: VecDeque::new(),
            page_size: self.page_size,
            exhausted: false,
        })
    }
}

impl WorldState for SqliteWorldState {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let row = self
            .rt
            .block_on(async {
                sqlx::query("SELECT value FROM world_state WHERE key = ?")
                    .bind(key)
                    .fetch_optional(&self.pool)
                    .await
            })
            .with_context(|| format!("Failed to fetch key: {}", key))?;

        match row {
            Some(row) => {
                let value: Vec<u8> = row
                    .try_get(0)
                    .with_context(|| format!("Failed to read value of key: {}", key))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.rt
            .block_on(async {
                sqlx::query("INSERT OR REPLACE INTO world_state (key, value) VALUES (?, ?)")
                    .bind(key)
                    .bind(value)
                    .execute(&self.pool)
                    .await
            })
            .with_context(|| format!("Failed to store key: {}", key))?;
        Ok(())
    }

    fn del_state(&self, key: &str) -> Result<(), StorageError> {
        self.rt
            .block_on(async {
                sqlx::query("DELETE FROM world_state WHERE key = ?")
                    .bind(key)
                    .execute(&self.pool)
                    .await
            })
            .with_context(|| format!("Failed to delete key: {}", key))?;
        Ok(())
    }

    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> Result<StateIter<'_>, StorageError> {
        Ok(self.iterator(start_key, end_key, None))
    }

    fn get_query_result(&self, selector: &Selector) -> Result<StateIter<'_>, StorageError> {
        Ok(self.iterator("", "", Some(selector.clone())))
    }
}

/// Paged iterator over the world_state table in key order
pub struct SqliteStateIterator {
    pool: SqlitePool,
    rt: Arc<Runtime>,
    start_key: String,
    end_key: String,
    /// Last key handed out; the next page starts strictly after it
    last_key: Option<String>,
    filter: Option<Selector>,
    buffer: VecDeque<KeyValue>,
    page_size: i64,
    exhausted: bool,
}

impl SqliteStateIterator {
    fn fetch_page(&mut self) -> Result<(), StorageError> {
        let rows: Vec<SqliteRow> = self
            .rt
            .block_on(async {
                match &self.last_key {
                    Some(last_key) => {
                        sqlx::query(
                            "SELECT key, value FROM world_state WHERE key > ? ORDER BY key LIMIT ?",
                        )
                        .bind(last_key.as_str())
                        .bind(self.page_size)
                        .fetch_all(&self.pool)
                        .await
                    }
                    None => {
                        sqlx::query(
                            "SELECT key, value FROM world_state WHERE key >= ? ORDER BY key LIMIT ?",
                        )
                        .bind(self.start_key.as_str())
                        .bind(self.page_size)
                        .fetch_all(&self.pool)
                        .await
                    }
                }
            })
            .context("Failed to scan world state")?;

        if (rows.len() as i64) < self.page_size {
            self.exhausted = true;
        }

        for row in rows {
            let key: String = row.try_get(0).context("Failed to read key column")?;
            let value: Vec<u8> = row.try_get(1).context("Failed to read value column")?;
            self.last_key = Some(key.clone());

            if !key_in_range(&key, &self.start_key, &self.end_key) {
                // Keys come back sorted, so everything after this is out of range too
                self.exhausted = true;
                break;
            }

            let keep = match &self.filter {
                Some(selector) => selector.matches_bytes(&value),
                None => true,
            };
            if keep {
                self.buffer.push_back(KeyValue::new(key, value));
            }
        }

        Ok(())
    }
}

impl Iterator for SqliteStateIterator {
    type Item = Result<KeyValue, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffer.pop_front() {
                return Some(Ok(entry));
            }
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
    }
}

impl StateIterator for SqliteStateIterator {}

impl std::fmt::Debug for SqliteWorldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteWorldState")
            .field("db_path", &self.db_path)
            .field("page_size", &self.page_size)
            .finish()
    }
}
