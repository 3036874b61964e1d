//! Lifecycle contract for tokenized energy records.
//!
//! Every operation is a pure function of the current world state and the
//! caller-supplied arguments, so independent executors replaying the same
//! calls reach identical state.

pub mod bootstrap;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod lifecycle;
pub mod query;

// Re-export the main types for convenience
pub use bootstrap::seed_records;
pub use config::{ContractConfig, DEFAULT_SALE_WINDOW_MINUTES};
pub use contract::EnergyContract;
pub use dispatch::Function;
pub use lifecycle::LifecycleEngine;
pub use query::QueryLayer;
