//! World-state digest.
//!
//! Executors that replay the same calls must end with byte-identical state.
//! The digest folds every key and value, in key order, into one SHA-256 hash so
//! two executors can compare a single value instead of the whole keyspace.

use crate::storage_traits::WorldState;
use energy_core::error::StorageError;
use sha2::{Digest, Sha256};
use std::fmt;

/// Domain separator for world-state digests
const DIGEST_DOMAIN: &[u8] = b"ENERGY_WorldState_v1";

/// SHA-256 commitment to the full contents of a world state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateDigest([u8; 32]);

impl StateDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash every entry of the world state in key order.
///
/// Keys and values are length-prefixed so that no two different states can
/// produce the same byte stream.
pub fn world_state_digest<S: WorldState + ?Sized>(state: &S) -> Result<StateDigest, StorageError> {
    let mut hasher = Sha256::new();
    hasher.update(DIGEST_DOMAIN);

    let mut entries = 0u64;
    for entry in state.get_state_by_range("", "")? {
        let entry = entry?;
        hasher.update((entry.key.len() as u64).to_le_bytes());
        hasher.update(entry.key.as_bytes());
        hasher.update((entry.value.len() as u64).to_le_bytes());
        hasher.update(&entry.value);
        entries += 1;
    }
    hasher.update(entries.to_le_bytes());

    let digest = StateDigest(hasher.finalize().into());
    log::debug!("World state digest over {} entries: {}", entries, digest);
    Ok(digest)
}
