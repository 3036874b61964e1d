//! String-argument entrypoint.
//!
//! Invocations arrive as a function name plus positional string arguments.
//! Responses are JSON: `null` for operations without a result, otherwise the
//! encoded return value.

use log::{debug, warn};
use serde::Serialize;

use energy_core::error::ContractError;
use energy_core::record::TokenIssue;
use energy_core::time::parse_reference_time;
use energy_storage_impl::WorldState;

use crate::contract::EnergyContract;

/// Contract functions reachable through [`EnergyContract::invoke`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    InitLedger,
    CreateAsset,
    ReadAsset,
    UpdateAsset,
    DeleteAsset,
    AssetExists,
    TransferAsset,
    QueryByStatus,
    GetAllAssets,
}

impl Function {
    /// Resolve a function name; `CreateAsset` and `createAsset` are the same function
    pub fn from_name(name: &str) -> Result<Self, ContractError> {
        let function = match name.to_ascii_lowercase().as_str() {
            "initledger" => Function::InitLedger,
            "createasset" => Function::CreateAsset,
            "readasset" => Function::ReadAsset,
            "updateasset" => Function::UpdateAsset,
            "deleteasset" => Function::DeleteAsset,
            "assetexists" => Function::AssetExists,
            "transferasset" => Function::TransferAsset,
            "querybystatus" => Function::QueryByStatus,
            "getallassets" => Function::GetAllAssets,
            _ => return Err(ContractError::UnknownFunction(name.to_string())),
        };
        Ok(function)
    }

    /// Accepted argument counts (inclusive)
    fn arity(&self) -> (usize, usize) {
        match self {
            Function::InitLedger => (1, 1),
            Function::CreateAsset => (7, 8),
            Function::ReadAsset
            | Function::UpdateAsset
            | Function::DeleteAsset
            | Function::AssetExists
            | Function::QueryByStatus => (1, 1),
            Function::TransferAsset => (3, 4),
            Function::GetAllAssets => (0, 0),
        }
    }
}

impl<S: WorldState> EnergyContract<S> {
    /// Dispatch a named call with positional string arguments
    pub fn invoke(&self, function: &str, args: &[String]) -> Result<Vec<u8>, ContractError> {
        let resolved = Function::from_name(function)?;
        check_arity(resolved, args)?;
        debug!("Invoking {:?} with {} arguments", resolved, args.len());

        let result = match resolved {
            Function::InitLedger => {
                let genesis = parse_reference_time(&args[0])?;
                self.init_ledger(genesis).and_then(|_| respond(function, &()))
            }
            Function::CreateAsset => {
                let mut issue = TokenIssue::new(
                    args[0].as_str(),
                    parse_f64("latitude", &args[1])?,
                    parse_f64("longitude", &args[2])?,
                    args[3].as_str(),
                    args[4].as_str(),
                    args[5].as_str(),
                );
                let reference_time = parse_reference_time(&args[6])?;
                if let Some(raw) = args.get(7) {
                    issue.appraised_value = Some(parse_i64("appraisedValue", raw)?);
                }
                self.create_asset(&issue, reference_time)
                    .and_then(|_| respond(function, &()))
            }
            Function::ReadAsset => self
                .read_asset(&args[0])
                .and_then(|record| respond(function, &record)),
            Function::UpdateAsset => self
                .update_asset(&args[0])
                .and_then(|_| respond(function, &())),
            Function::DeleteAsset => self
                .delete_asset(&args[0])
                .and_then(|_| respond(function, &())),
            Function::AssetExists => self
                .asset_exists(&args[0])
                .and_then(|exists| respond(function, &exists)),
            Function::TransferAsset => {
                let reference_time = parse_reference_time(&args[2])?;
                let new_value = match args.get(3) {
                    Some(raw) => Some(parse_i64("appraisedValue", raw)?),
                    None => None,
                };
                self.transfer_asset(&args[0], &args[1], reference_time, new_value)
                    .and_then(|previous_owner| respond(function, &previous_owner))
            }
            Function::QueryByStatus => self
                .query_by_status(&args[0])
                .and_then(|records| respond(function, &records)),
            Function::GetAllAssets => self
                .get_all_assets()
                .and_then(|records| respond(function, &records)),
        };

        if let Err(e) = &result {
            warn!("{} failed: {}", function, e);
        }
        result
    }
}

fn check_arity(function: Function, args: &[String]) -> Result<(), ContractError> {
    let (min, max) = function.arity();
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(ContractError::InvalidArgument(format!(
            "{:?} expects {} arguments, got {}",
            function,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn parse_f64(name: &str, raw: &str) -> Result<f64, ContractError> {
    raw.trim()
        .parse()
        .map_err(|e| ContractError::InvalidArgument(format!("{} {:?}: {}", name, raw, e)))
}

fn parse_i64(name: &str, raw: &str) -> Result<i64, ContractError> {
    raw.trim()
        .parse()
        .map_err(|e| ContractError::InvalidArgument(format!("{} {:?}: {}", name, raw, e)))
}

fn respond<T: Serialize + ?Sized>(function: &str, value: &T) -> Result<Vec<u8>, ContractError> {
    serde_json::to_vec(value).map_err(|source| ContractError::Encoding {
        id: format!("{} response", function),
        source,
    })
}
