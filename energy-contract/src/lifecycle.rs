//! Record lifecycle engine.
//!
//! Each operation reloads what it needs from the world state, validates it,
//! and performs at most one write. Nothing is cached between calls and no
//! clock is read: the reference time always comes from the caller.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use energy_core::codec;
use energy_core::error::ContractError;
use energy_core::record::{EnergyRecord, Status, TokenIssue};
use energy_storage_impl::WorldState;

use crate::config::ContractConfig;

/// Single-record operations against a world state
pub struct LifecycleEngine<'a, S: WorldState + ?Sized> {
    state: &'a S,
    config: &'a ContractConfig,
}

impl<'a, S: WorldState + ?Sized> LifecycleEngine<'a, S> {
    pub fn new(state: &'a S, config: &'a ContractConfig) -> Self {
        Self { state, config }
    }

    /// True iff a value is currently stored under `id`
    pub fn exists(&self, id: &str) -> Result<bool, ContractError> {
        Ok(self.state.get_state(id)?.is_some())
    }

    /// Issue a new token generated at `reference_time`
    pub fn create(
        &self,
        issue: &TokenIssue,
        reference_time: DateTime<Utc>,
    ) -> Result<EnergyRecord, ContractError> {
        if let Err(e) = issue.validate() {
            warn!("Rejected issuance of energy {}: {}", issue.id, e);
            return Err(e);
        }
        if self.exists(&issue.id)? {
            warn!("Rejected issuance of energy {}: already exists", issue.id);
            return Err(ContractError::already_exists(&issue.id));
        }

        let record = EnergyRecord::token(issue, reference_time);
        self.store(&record)?;

        info!(
            "Issued energy {} ({}/{}) by {} at {}",
            record.id, record.large_category, record.small_category, record.producer, reference_time
        );
        Ok(record)
    }

    /// Load and decode the record stored under `id`
    pub fn read(&self, id: &str) -> Result<EnergyRecord, ContractError> {
        let bytes = self
            .state
            .get_state(id)?
            .ok_or_else(|| ContractError::not_found(id))?;

        debug!("Read energy {} ({} bytes)", id, bytes.len());
        codec::decode(id, &bytes)
    }

    /// Sell a token to `new_owner`, returning the previous owner.
    ///
    /// The token must still be `Generated` and `reference_time` must fall
    /// strictly before `GeneratedTime + sale_window`.
    pub fn transfer(
        &self,
        id: &str,
        new_owner: &str,
        reference_time: DateTime<Utc>,
        new_appraised_value: Option<i64>,
    ) -> Result<String, ContractError> {
        let mut record = self.read(id)?;

        if !record.is_for_sale() {
            warn!(
                "Rejected transfer of energy {}: status is {} ({:?})",
                id, record.status, record.document_type
            );
            return Err(ContractError::not_for_sale(id));
        }

        if !record.within_sale_window(reference_time, self.config.sale_window) {
            warn!(
                "Rejected transfer of energy {}: sale window closed at {:?}, reference time {}",
                id,
                record.sale_deadline(self.config.sale_window),
                reference_time
            );
            return Err(ContractError::SaleWindowExpired {
                id: id.to_string(),
                window_minutes: self.config.sale_window_minutes(),
            });
        }

        let previous_owner = std::mem::replace(&mut record.owner, new_owner.to_string());
        record.purchased_time = Some(reference_time);
        record.status = Status::Sold;
        if let Some(value) = new_appraised_value {
            record.appraised_value = value;
        }

        self.store(&record)?;

        info!(
            "Transferred energy {} from {} to {} at {} (value {})",
            id, previous_owner, record.owner, reference_time, record.appraised_value
        );
        Ok(previous_owner)
    }

    /// Replace the record with its minimal expired form.
    ///
    /// Every field other than the identifier and the document type is
    /// discarded. This is not a partial update and cannot be undone. The stored
    /// value must decode, so a cost entry stays a cost entry.
    pub fn invalidate(&self, id: &str) -> Result<(), ContractError> {
        let record = match self.read(id) {
            Ok(record) => record,
            Err(e) => {
                warn!("Rejected invalidation of energy {}: {}", id, e);
                return Err(e);
            }
        };

        self.store(&EnergyRecord::expired(id, record.document_type))?;
        info!("Invalidated energy {} ({:?})", id, record.document_type);
        Ok(())
    }

    /// Remove the key entirely
    pub fn delete(&self, id: &str) -> Result<(), ContractError> {
        if !self.exists(id)? {
            warn!("Rejected deletion of energy {}: does not exist", id);
            return Err(ContractError::not_found(id));
        }

        self.state.del_state(id)?;
        info!("Deleted energy {}", id);
        Ok(())
    }

    /// Encode and write a record under its own identifier
    pub(crate) fn store(&self, record: &EnergyRecord) -> Result<(), ContractError> {
        let bytes = codec::encode(record)?;
        self.state.put_state(&record.id, &bytes)?;
        Ok(())
    }
}
