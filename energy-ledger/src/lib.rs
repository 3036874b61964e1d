//! Tokenized energy ledger
//!
//! This crate re-exports all the components of the ledger.

pub use energy_contract::*;
pub use energy_core::*;
pub use energy_storage_impl::*;
