use crate::storage_traits::{key_in_range, KeyValue, StateIter, VecStateIterator, WorldState};
use energy_core::error::StorageError;
use energy_core::selector::Selector;

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// In-memory world state backed by an ordered map.
///
/// Used for tests and for embedding the contract in a single process. Scans
/// work on a snapshot taken when the iterator is created.
#[derive(Debug, Default)]
pub struct MemoryWorldState {
    entries: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryWorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Vec<u8>>>, StorageError> {
        self.entries
            .lock()
            .map_err(|e| StorageError::Other(format!("Failed to acquire lock: {}", e)))
    }

    fn collect<F>(&self, mut keep: F) -> Result<Vec<KeyValue>, StorageError>
    where
        F: FnMut(&str, &[u8]) -> bool,
    {
        let entries = self.lock()?;
        Ok(entries
            .iter()
            .filter(|(key, value)| keep(key, value))
            .map(|(key, value)| KeyValue::new(key.clone(), value.clone()))
            .collect())
    }
}

impl WorldState for MemoryWorldState {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.lock()?.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn del_state(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn get_state_by_range(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> Result<StateIter<'_>, StorageError> {
        let entries = self.collect(|key, _| key_in_range(key, start_key, end_key))?;
        Ok(Box::new(VecStateIterator::new(entries)))
    }

    fn get_query_result(&self, selector: &Selector) -> Result<StateIter<'_>, StorageError> {
        let entries = self.collect(|_, value| selector.matches_bytes(value))?;
        Ok(Box::new(VecStateIterator::new(entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(iter: StateIter<'_>) -> Vec<String> {
        iter.map(|r| r.unwrap().key).collect()
    }

    #[test]
    fn test_basic_storage_operations() {
        let state = MemoryWorldState::new();

        // Test put and get
        state.put_state("energy1", b"{}").unwrap();
        assert_eq!(state.get_state("energy1").unwrap(), Some(b"{}".to_vec()));
        assert_eq!(state.get_state("energy2").unwrap(), None);

        // Test delete, including an absent key
        state.del_state("energy1").unwrap();
        state.del_state("energy1").unwrap();
        assert!(state.get_state("energy1").unwrap().is_none());
        assert!(state.is_empty().unwrap());
    }

    #[test]
    fn test_poisoned_lock_is_an_error() {
        let state = std::sync::Arc::new(MemoryWorldState::new());
        state.put_state("energy1", b"{}").unwrap();
        assert_eq!(state.len().unwrap(), 1);

        let poisoner = state.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the world state lock");
        })
        .join();

        assert!(state.len().is_err());
        assert!(state.is_empty().is_err());
        assert!(state.get_state("energy1").is_err());
    }

    #[test]
    fn test_scan_operations() {
        let state = MemoryWorldState::new();
        for key in ["energy3", "energy1", "energy2", "solar-power-cost"] {
            state.put_state(key, b"{}").unwrap();
        }

        assert_eq!(
            keys(state.get_state_by_range("", "").unwrap()),
            vec!["energy1", "energy2", "energy3", "solar-power-cost"]
        );
        assert_eq!(
            keys(state.get_state_by_range("energy2", "energy9").unwrap()),
            vec!["energy2", "energy3"]
        );
    }

    #[test]
    fn test_selector_query() {
        let state = MemoryWorldState::new();
        state.put_state("a", br#"{"Status":"sold"}"#).unwrap();
        state.put_state("b", br#"{"Status":"generated"}"#).unwrap();
        state.put_state("c", b"not json").unwrap();

        let selector = Selector::new().eq("Status", "generated");
        assert_eq!(keys(state.get_query_result(&selector).unwrap()), vec!["b"]);
    }
}
