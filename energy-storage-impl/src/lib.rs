pub mod digest;
pub mod memory;
pub mod storage_traits;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "rocksdb")]
pub mod rocksdb;

// Re-export the main types for convenience
pub use digest::{world_state_digest, StateDigest};
pub use memory::MemoryWorldState;
pub use storage_traits::{KeyValue, StateIter, StateIterator, VecStateIterator, WorldState};

// Re-export the storage implementations
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteWorldState;

#[cfg(feature = "rocksdb")]
pub use self::rocksdb::RocksDbWorldState;
