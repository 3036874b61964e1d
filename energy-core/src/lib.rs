pub mod codec;
pub mod error;
pub mod record;
pub mod selector;
pub mod time;

// Re-export the main types for convenience
pub use error::{ContractError, StorageError};
pub use record::{DocumentType, EnergyRecord, Status, TokenIssue};
pub use selector::{FilterOp, Predicate, Selector};
