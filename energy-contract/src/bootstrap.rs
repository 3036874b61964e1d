//! Genesis seeding of the ledger.

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};

use energy_core::error::ContractError;
use energy_core::record::{EnergyRecord, Status, TokenIssue};
use energy_storage_impl::WorldState;

use crate::lifecycle::LifecycleEngine;

/// A sample token, timed relative to genesis
struct SeedToken {
    id: &'static str,
    producer: &'static str,
    sale: Option<SeedSale>,
    generated_minutes_ago: i64,
}

struct SeedSale {
    owner: &'static str,
    value: i64,
    purchased_minutes_ago: i64,
}

const SEED_TOKENS: [SeedToken; 6] = [
    SeedToken {
        id: "energy1",
        producer: "Tomoko",
        sale: None,
        generated_minutes_ago: 60,
    },
    SeedToken {
        id: "energy2",
        producer: "Brad",
        sale: None,
        generated_minutes_ago: 50,
    },
    SeedToken {
        id: "energy3",
        producer: "Tomoko",
        sale: Some(SeedSale {
            owner: "Jin Soo",
            value: 100,
            purchased_minutes_ago: 35,
        }),
        generated_minutes_ago: 40,
    },
    SeedToken {
        id: "energy4",
        producer: "Max",
        sale: None,
        generated_minutes_ago: 30,
    },
    SeedToken {
        id: "energy5",
        producer: "Adriana",
        sale: None,
        generated_minutes_ago: 20,
    },
    SeedToken {
        id: "energy6",
        producer: "Michel",
        sale: None,
        generated_minutes_ago: 0,
    },
];

/// Per-category unit costs: slug, large category, small category, cost
const SEED_COSTS: [(&str, &str, &str, i64); 4] = [
    ("solar-power-cost", "green", "solar", 25),
    ("wind-power-cost", "green", "wind", 20),
    ("hydro-power-cost", "green", "hydro", 15),
    ("biomass-power-cost", "green", "biomass", 30),
];

/// The fixed genesis records, relative to `genesis_time`
pub fn seed_records(genesis_time: DateTime<Utc>, with_costs: bool) -> Vec<EnergyRecord> {
    let mut records: Vec<EnergyRecord> = SEED_TOKENS
        .iter()
        .map(|seed| {
            let issue = TokenIssue::new(seed.id, 1.0, 1.0, seed.producer, "green", "solar");
            let generated = genesis_time - Duration::minutes(seed.generated_minutes_ago);
            let mut record = EnergyRecord::token(&issue, generated);

            if let Some(sale) = &seed.sale {
                record.owner = sale.owner.to_string();
                record.appraised_value = sale.value;
                record.status = Status::Sold;
                record.purchased_time =
                    Some(genesis_time - Duration::minutes(sale.purchased_minutes_ago));
            }
            record
        })
        .collect();

    if with_costs {
        records.extend(
            SEED_COSTS
                .iter()
                .map(|(slug, large, small, cost)| EnergyRecord::cost(*slug, *large, *small, *cost)),
        );
    }

    records
}

/// Write the genesis records.
///
/// Every key is checked before anything is written, so a repeated bootstrap
/// fails with `AlreadyExists` for the first taken key and leaves the world
/// state as it was.
pub fn init_ledger<S: WorldState + ?Sized>(
    engine: &LifecycleEngine<'_, S>,
    genesis_time: DateTime<Utc>,
    with_costs: bool,
) -> Result<usize, ContractError> {
    let records = seed_records(genesis_time, with_costs);

    for record in &records {
        if engine.exists(&record.id)? {
            warn!("Ledger bootstrap aborted: {} already exists", record.id);
            return Err(ContractError::already_exists(&record.id));
        }
    }

    for record in &records {
        engine.store(record)?;
    }

    info!(
        "Ledger initialised with {} records at genesis {}",
        records.len(),
        genesis_time
    );
    Ok(records.len())
}
