#![cfg(feature = "rocksdb")]

use crate::storage_traits::{KeyValue, StateIter, StateIterator, WorldState};
use anyhow::Context;
use energy_core::error::StorageError;
use energy_core::selector::Selector;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBIteratorWithThreadMode, Direction, IteratorMode,
    Options, DB,
};
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::Arc,
};

// Column family holding the world state
const CF_WORLD_STATE: &str = "world_state";

/// RocksDB implementation of the world state.
///
/// RocksDB's default comparator orders keys bytewise, which is the order the
/// contract expects from range scans.
pub struct RocksDbWorldState {
    db: Arc<DB>,
    db_path: PathBuf,
}

impl RocksDbWorldState {
    /// Opens (or creates) a RocksDB world state at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db_path = path.as_ref().to_path_buf();

        // Set up database options
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_world_state = ColumnFamilyDescriptor::new(CF_WORLD_STATE, Options::default());

        let db = DB::open_cf_descriptors(&opts, &db_path, vec![cf_world_state])
            .with_context(|| format!("Failed to open RocksDB database at {:?}", db_path))?;

        log::debug!("Opened RocksDB world state at {:?}", db_path);

        Ok(Self {
            db: Arc::new(db),
            db_path,
        })
    }

    fn cf(&self) -> Result<&ColumnFamily, StorageError> {
        self.db.cf_handle(CF_WORLD_STATE).ok_or_else(|| {
            StorageError::Database("World state column family not found".to_string())
        })
    }

    fn iterator(
        &self,
        start_key: &str,
        end_key: &str,
        filter: Option<Selector>,
    ) -> Result<StateIter<'_>, StorageError> {
        let cf = self.cf()?;
        let mode = if start_key.is_empty() {
            IteratorMode::Start
        } else {
            IteratorMode::From(start_key.as_bytes(), Direction::Forward)
        };

        Ok(Box::new(RocksDbStateIterator {
            inner: self.db.iterator_cf(cf, mode),
            end_key: end_key.to_string(),
            filter,
            finished: false,
        }))
    }
}

impl WorldState for RocksDbWorldState {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let cf = self.cf()?;
        let value = self
            .db
            .get_cf(cf, key.as_bytes())
            .with_context(|| format!("Failed to fetch key: {}", key))?;
        Ok(value)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let cf = self.cf()?;
        self.db
            .put_cf(cf, key.as_bytes(), value)
            .with_context(|| format!("Failed to store key: {}", key))?;
        Ok(())
    }

    fn del_state(&self, key: &str) -> Result<(), StorageError> {
        let cf = self.cf()?;
        self.db
            .delete_cf(cf, key.as_bytes())
            .with_context(|| format!("Failed to delete key: {}", key))?;
        Ok(())
    }

    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> Result<StateIter<'_>, StorageError> {
        self.iterator(start_key, end_key, None)
    }

    fn get_query_result(&self, selector: &Selector) -> Result<StateIter<'_>, StorageError> {
        self.iterator("", "", Some(selector.clone()))
    }
}

/// Iterator implementation for RocksDB world state
pub struct RocksDbStateIterator<'a> {
    inner: DBIteratorWithThreadMode<'a, DB>,
    end_key: String,
    filter: Option<Selector>,
    finished: bool,
}

impl Iterator for RocksDbStateIterator<'_> {
    type Item = Result<KeyValue, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let (key, value) = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(StorageError::Database(format!(
                        "Failed to iterate world state: {}",
                        e
                    ))));
                }
            };

            let key = match String::from_utf8(key.into_vec()) {
                Ok(key) => key,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(StorageError::Serialization(format!(
                        "Non UTF-8 key in world state: {}",
                        e
                    ))));
                }
            };

            if !self.end_key.is_empty() && key.as_str() >= self.end_key.as_str() {
                self.finished = true;
                return None;
            }

            if let Some(selector) = &self.filter {
                if !selector.matches_bytes(&value) {
                    continue;
                }
            }

            return Some(Ok(KeyValue::new(key, value.into_vec())));
        }
        None
    }
}

impl StateIterator for RocksDbStateIterator<'_> {}

impl Debug for RocksDbWorldState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbWorldState")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_basic_storage_operations() {
        // Create temporary directory for test database
        let temp_dir = tempdir().unwrap();
        let state = RocksDbWorldState::new(temp_dir.path().join("state")).unwrap();

        state.put_state("energy1", b"{}").unwrap();
        assert_eq!(state.get_state("energy1").unwrap(), Some(b"{}".to_vec()));

        state.del_state("energy1").unwrap();
        assert!(state.get_state("energy1").unwrap().is_none());
    }

    #[test]
    fn test_range_and_selector() {
        let temp_dir = tempdir().unwrap();
        let state = RocksDbWorldState::new(temp_dir.path().join("scan")).unwrap();

        state.put_state("energy1", br#"{"Status":"generated"}"#).unwrap();
        state.put_state("energy2", br#"{"Status":"sold"}"#).unwrap();
        state.put_state("energy3", br#"{"Status":"generated"}"#).unwrap();

        let range: Vec<String> = state
            .get_state_by_range("energy2", "")
            .unwrap()
            .map(|r| r.unwrap().key)
            .collect();
        assert_eq!(range, vec!["energy2", "energy3"]);

        let selector = Selector::new().eq("Status", "generated");
        let matched: Vec<String> = state
            .get_query_result(&selector)
            .unwrap()
            .map(|r| r.unwrap().key)
            .collect();
        assert_eq!(matched, vec!["energy1", "energy3"]);
    }

    #[test]
    fn test_non_utf8_key_is_a_serialization_error() {
        let temp_dir = tempdir().unwrap();
        let state = RocksDbWorldState::new(temp_dir.path().join("keys")).unwrap();

        let cf = state.cf().unwrap();
        state.db.put_cf(cf, b"\xff\xfe", b"{}").unwrap();

        let mut iter = state.get_state_by_range("", "").unwrap();
        assert!(matches!(
            iter.next(),
            Some(Err(StorageError::Serialization(_)))
        ));
        assert!(iter.next().is_none());
    }
}
