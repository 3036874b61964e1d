use chrono::{DateTime, Utc};

use energy_core::error::ContractError;
use energy_core::record::{EnergyRecord, Status, TokenIssue};
use energy_storage_impl::WorldState;

use crate::bootstrap;
use crate::config::ContractConfig;
use crate::lifecycle::LifecycleEngine;
use crate::query::QueryLayer;

/// Caller-facing contract over a world state.
///
/// Each method is one independent invocation: it loads fresh state, validates,
/// and writes at most what the operation names.
#[derive(Debug)]
pub struct EnergyContract<S: WorldState> {
    state: S,
    config: ContractConfig,
}

impl<S: WorldState> EnergyContract<S> {
    pub fn new(state: S) -> Self {
        Self::with_config(state, ContractConfig::default())
    }

    pub fn with_config(state: S, config: ContractConfig) -> Self {
        Self { state, config }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn into_state(self) -> S {
        self.state
    }

    fn lifecycle(&self) -> LifecycleEngine<'_, S> {
        LifecycleEngine::new(&self.state, &self.config)
    }

    fn query(&self) -> QueryLayer<'_, S> {
        QueryLayer::new(&self.state)
    }

    /// Seed the genesis records; returns how many were written
    pub fn init_ledger(&self, genesis_time: DateTime<Utc>) -> Result<usize, ContractError> {
        bootstrap::init_ledger(&self.lifecycle(), genesis_time, self.config.seed_cost_records)
    }

    pub fn create_asset(
        &self,
        issue: &TokenIssue,
        reference_time: DateTime<Utc>,
    ) -> Result<EnergyRecord, ContractError> {
        self.lifecycle().create(issue, reference_time)
    }

    pub fn read_asset(&self, id: &str) -> Result<EnergyRecord, ContractError> {
        self.lifecycle().read(id)
    }

    /// Forced invalidation: the record keeps only its id and `Status = Expired`
    pub fn update_asset(&self, id: &str) -> Result<(), ContractError> {
        self.lifecycle().invalidate(id)
    }

    pub fn delete_asset(&self, id: &str) -> Result<(), ContractError> {
        self.lifecycle().delete(id)
    }

    pub fn asset_exists(&self, id: &str) -> Result<bool, ContractError> {
        self.lifecycle().exists(id)
    }

    /// Sell a token; returns the previous owner
    pub fn transfer_asset(
        &self,
        id: &str,
        new_owner: &str,
        reference_time: DateTime<Utc>,
        new_appraised_value: Option<i64>,
    ) -> Result<String, ContractError> {
        self.lifecycle()
            .transfer(id, new_owner, reference_time, new_appraised_value)
    }

    /// Tokens in the named status; unknown names are rejected
    pub fn query_by_status(&self, status: &str) -> Result<Vec<EnergyRecord>, ContractError> {
        let status: Status = status.parse()?;
        self.query().by_status(status)
    }

    pub fn get_all_assets(&self) -> Result<Vec<EnergyRecord>, ContractError> {
        self.query().all()
    }

    pub fn get_cost_entries(&self) -> Result<Vec<EnergyRecord>, ContractError> {
        self.query().cost_entries()
    }
}
