//! Listing and filtering over the world state.
//!
//! Results are returned in the store's native order. A single undecodable
//! entry fails the whole call; partial listings are never returned.

use log::debug;

use energy_core::codec::{self, fields};
use energy_core::error::ContractError;
use energy_core::record::{DocumentType, EnergyRecord, Status};
use energy_core::selector::Selector;
use energy_storage_impl::{StateIter, WorldState};

/// Read-only queries over a world state
pub struct QueryLayer<'a, S: WorldState + ?Sized> {
    state: &'a S,
}

impl<'a, S: WorldState + ?Sized> QueryLayer<'a, S> {
    pub fn new(state: &'a S) -> Self {
        Self { state }
    }

    /// Selector matching tokens in the given status
    pub fn status_selector(status: Status) -> Selector {
        Selector::new()
            .eq(fields::DOCUMENT_TYPE, DocumentType::Token.as_str())
            .eq(fields::STATUS, status.as_str())
    }

    /// All tokens whose status equals `status`
    pub fn by_status(&self, status: Status) -> Result<Vec<EnergyRecord>, ContractError> {
        let selector = Self::status_selector(status);
        debug!("Querying world state with {}", selector.to_query_string());

        let records = decode_all(self.state.get_query_result(&selector)?)?;
        debug!("{} records with status {}", records.len(), status);
        Ok(records)
    }

    /// Every entry in the keyspace, tokens and cost entries alike
    pub fn all(&self) -> Result<Vec<EnergyRecord>, ContractError> {
        let records = decode_all(self.state.get_state_by_range("", "")?)?;
        debug!("Scanned {} records", records.len());
        Ok(records)
    }

    /// Cost reference entries only
    pub fn cost_entries(&self) -> Result<Vec<EnergyRecord>, ContractError> {
        let selector = Selector::new().eq(fields::DOCUMENT_TYPE, DocumentType::Cost.as_str());
        decode_all(self.state.get_query_result(&selector)?)
    }
}

/// Drain an iterator, decoding every value. Stops at the first failure.
fn decode_all(iter: StateIter<'_>) -> Result<Vec<EnergyRecord>, ContractError> {
    let mut records = Vec::new();
    for entry in iter {
        let entry = entry?;
        records.push(codec::decode(&entry.key, &entry.value)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use energy_core::record::TokenIssue;
    use energy_storage_impl::MemoryWorldState;

    fn put(state: &MemoryWorldState, record: &EnergyRecord) {
        state
            .put_state(&record.id, &codec::encode(record).unwrap())
            .unwrap();
    }

    fn seeded() -> MemoryWorldState {
        let t0 = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        let state = MemoryWorldState::new();

        let issue = |id: &str| TokenIssue::new(id, 1.0, 1.0, "Tomoko", "green", "solar");
        let generated = EnergyRecord::token(&issue("e1"), t0);
        let mut sold = EnergyRecord::token(&issue("e2"), t0);
        sold.status = Status::Sold;
        sold.owner = "Brad".to_string();
        sold.purchased_time = Some(t0);

        put(&state, &generated);
        put(&state, &sold);
        put(&state, &EnergyRecord::cost("solar-power-cost", "green", "solar", 25));
        state
    }

    #[test]
    fn test_status_selector_is_typed() {
        let selector = QueryLayer::<MemoryWorldState>::status_selector(Status::Generated);
        assert_eq!(
            selector.to_query_string(),
            r#"{"selector":{"DocumentType":{"$eq":"token"},"Status":{"$eq":"generated"}}}"#
        );
    }

    #[test]
    fn test_by_status_excludes_cost_entries() {
        let state = seeded();
        let query = QueryLayer::new(&state);

        let generated = query.by_status(Status::Generated).unwrap();
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].id, "e1");

        let sold = query.by_status(Status::Sold).unwrap();
        assert_eq!(
            sold.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["e2"]
        );

        assert!(query.by_status(Status::Expired).unwrap().is_empty());
        assert_eq!(query.cost_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_by_status_finds_older_layouts() {
        let state = MemoryWorldState::new();
        // Written before records carried a DocumentType, with the old invalidation status
        state
            .put_state(
                "energy1",
                br#"{"AppraisedValue":0,"Generated Time":"2024-04-01T09:00:00Z","ID":"energy1","Latitude":1,"Longitude":1,"Owner":"Tomoko","Producer":"Tomoko","Purchased Time":"0001-01-01T00:00:00Z","Status":"generated"}"#,
            )
            .unwrap();
        state
            .put_state(
                "energy2",
                br#"{"AppraisedValue":0,"Generated Time":"0001-01-01T00:00:00Z","ID":"energy2","Latitude":0,"Longitude":0,"Owner":"","Producer":"","Purchased Time":"0001-01-01T00:00:00Z","Status":"old"}"#,
            )
            .unwrap();
        put(&state, &EnergyRecord::cost("solar-power-cost", "green", "solar", 25));

        let query = QueryLayer::new(&state);
        let generated = query.by_status(Status::Generated).unwrap();
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].id, "energy1");
        assert_eq!(generated[0].document_type, DocumentType::Token);

        let expired = query.by_status(Status::Expired).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, "energy2");
    }

    #[test]
    fn test_all_returns_heterogeneous_keyspace() {
        let state = seeded();
        let all = QueryLayer::new(&state).all().unwrap();

        assert_eq!(all.len(), 3);
        assert_eq!(all.iter().filter(|r| r.is_cost()).count(), 1);
    }

    #[test]
    fn test_one_corrupt_entry_fails_the_listing() {
        let state = seeded();
        state.put_state("e0", br#"{"ID":"e0","Status":"unknown"}"#).unwrap();

        let err = QueryLayer::new(&state).all().unwrap_err();
        assert!(matches!(err, ContractError::Decoding { ref key, .. } if key == "e0"));
    }
}
