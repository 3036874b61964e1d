use energy_core::error::StorageError;
use energy_core::selector::Selector;

use std::iter::Iterator;

/// A key and the raw bytes stored under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Single-pass iterator over world-state entries.
///
/// Iterators hold whatever backend resources they need until they are dropped.
pub trait StateIterator: Iterator<Item = Result<KeyValue, StorageError>> {}

/// Boxed iterator returned by range scans and selector queries
pub type StateIter<'a> = Box<dyn StateIterator + 'a>;

/// Key-value world state the contract runs against.
///
/// Every method is deterministic for a given store content. Iteration order is
/// ascending byte order of the key for both range scans and selector queries.
pub trait WorldState {
    /// Get the value stored under a key
    ///
    /// # Returns
    /// Some(bytes) if the key exists, None otherwise
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a value, replacing whatever was under the key
    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove a key. Removing an absent key is not an error.
    fn del_state(&self, key: &str) -> Result<(), StorageError>;

    /// Scan the half-open key range `[start_key, end_key)`
    ///
    /// # Parameters
    /// * `start_key` - Inclusive lower bound; empty means the first key
    /// * `end_key` - Exclusive upper bound; empty means past the last key
    fn get_state_by_range(&self, start_key: &str, end_key: &str)
        -> Result<StateIter<'_>, StorageError>;

    /// Return every entry whose JSON value satisfies the selector
    fn get_query_result(&self, selector: &Selector) -> Result<StateIter<'_>, StorageError>;
}

impl<T: WorldState + ?Sized> WorldState for &T {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        (**self).put_state(key, value)
    }

    fn del_state(&self, key: &str) -> Result<(), StorageError> {
        (**self).del_state(key)
    }

    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> Result<StateIter<'_>, StorageError> {
        (**self).get_state_by_range(start_key, end_key)
    }

    fn get_query_result(&self, selector: &Selector) -> Result<StateIter<'_>, StorageError> {
        (**self).get_query_result(selector)
    }
}

/// Whether `key` falls inside the half-open range `[start_key, end_key)`,
/// treating empty bounds as open.
pub fn key_in_range(key: &str, start_key: &str, end_key: &str) -> bool {
    let above_start = start_key.is_empty() || key >= start_key;
    let below_end = end_key.is_empty() || key < end_key;
    above_start && below_end
}

/// Iterator over entries already materialised in memory
pub struct VecStateIterator {
    entries: std::vec::IntoIter<KeyValue>,
}

impl VecStateIterator {
    pub fn new(entries: Vec<KeyValue>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }
}

impl Iterator for VecStateIterator {
    type Item = Result<KeyValue, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(Ok)
    }
}

impl StateIterator for VecStateIterator {}
