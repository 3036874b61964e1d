//! Record codec.
//!
//! Records are persisted as compact JSON objects whose keys appear in byte-wise
//! alphabetical order. Two executors holding the same logical record therefore
//! write the same bytes, which is what lets replicated state agree.

use serde::ser::Error as _;

use crate::error::ContractError;
use crate::record::EnergyRecord;

/// Persisted key names, in the order they are written
pub const FIELD_ORDER: [&str; 12] = [
    "AppraisedValue",
    "DocumentType",
    "Generated Time",
    "ID",
    "LargeCategory",
    "Latitude",
    "Longitude",
    "Owner",
    "Producer",
    "Purchased Time",
    "SmallCategory",
    "Status",
];

/// Persisted key names used by selector queries
pub mod fields {
    pub const DOCUMENT_TYPE: &str = "DocumentType";
    pub const ID: &str = "ID";
    pub const OWNER: &str = "Owner";
    pub const STATUS: &str = "Status";
}

/// Serialize a record to its storage bytes.
///
/// Non-finite coordinates are refused: JSON has no spelling for them and they
/// would be written as `null`, which no reader accepts.
pub fn encode(record: &EnergyRecord) -> Result<Vec<u8>, ContractError> {
    if !record.latitude.is_finite() || !record.longitude.is_finite() {
        return Err(ContractError::Encoding {
            id: record.id.clone(),
            source: serde_json::Error::custom(format!(
                "coordinates must be finite, got ({}, {})",
                record.latitude, record.longitude
            )),
        });
    }

    serde_json::to_vec(record).map_err(|source| ContractError::Encoding {
        id: record.id.clone(),
        source,
    })
}

/// Parse the bytes stored under `key`
pub fn decode(key: &str, bytes: &[u8]) -> Result<EnergyRecord, ContractError> {
    serde_json::from_slice(bytes).map_err(|source| ContractError::Decoding {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DocumentType, Status, TokenIssue};
    use chrono::{Duration, TimeZone, Utc};

    fn sold_token() -> EnergyRecord {
        let t0 = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        let issue = TokenIssue::new("energy3", 35.6812, 139.7671, "Tomoko", "green", "solar")
            .with_appraised_value(100);
        let mut record = EnergyRecord::token(&issue, t0);
        record.owner = "Jin Soo".to_string();
        record.status = Status::Sold;
        record.purchased_time = Some(t0 + Duration::minutes(5));
        record
    }

    /// Positions of each persisted key in the encoded text
    fn key_positions(encoded: &str) -> Vec<usize> {
        FIELD_ORDER
            .iter()
            .map(|key| encoded.find(&format!("\"{}\":", key)).unwrap())
            .collect()
    }

    #[test]
    fn test_keys_are_written_alphabetically() {
        let encoded = String::from_utf8(encode(&sold_token()).unwrap()).unwrap();
        let positions = key_positions(&encoded);

        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);

        let mut names = FIELD_ORDER.to_vec();
        names.sort_unstable();
        assert_eq!(names, FIELD_ORDER.to_vec());
    }

    #[test]
    fn test_encoding_is_byte_stable() {
        let first = encode(&sold_token()).unwrap();
        let second = encode(&sold_token().clone()).unwrap();
        assert_eq!(first, second);

        let decoded = decode("energy3", &first).unwrap();
        assert_eq!(decoded, sold_token());
        assert_eq!(encode(&decoded).unwrap(), first);
    }

    #[test]
    fn test_coordinates_survive_encoding() {
        let base = sold_token();
        let mut seed = 0x9E37_79B9_7F4A_7C15u64;
        let mut next = || {
            // splitmix64
            seed = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
            let mut z = seed;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
            z ^ (z >> 31)
        };

        for i in 0..20_000u64 {
            let mut record = base.clone();
            record.latitude = -90.0 + 180.0 * (i as f64) / 19_999.0;
            record.longitude = f64::from_bits(next());
            if !record.longitude.is_finite() {
                record.longitude = 180.0 * ((next() >> 11) as f64) / ((1u64 << 53) as f64);
            }

            let bytes = encode(&record).unwrap();
            let decoded = decode(&record.id, &bytes).unwrap();
            assert_eq!(decoded.latitude.to_bits(), record.latitude.to_bits());
            assert_eq!(decoded.longitude.to_bits(), record.longitude.to_bits());
            assert_eq!(encode(&decoded).unwrap(), bytes);
        }
    }

    #[test]
    fn test_non_finite_coordinates_are_not_encoded() {
        let mut record = sold_token();
        record.latitude = f64::NAN;
        assert!(matches!(
            encode(&record).unwrap_err(),
            ContractError::Encoding { ref id, .. } if id == "energy3"
        ));

        record.latitude = 1.0;
        record.longitude = f64::INFINITY;
        assert!(encode(&record).is_err());
    }

    #[test]
    fn test_expired_record_persists_zero_values() {
        let encoded = encode(&EnergyRecord::expired("e1", DocumentType::Token)).unwrap();
        let text = String::from_utf8(encoded.clone()).unwrap();
        assert!(text.contains("\"Generated Time\":\"0001-01-01T00:00:00Z\""));
        assert!(text.contains("\"Status\":\"expired\""));

        let decoded = decode("e1", &encoded).unwrap();
        assert_eq!(decoded, EnergyRecord::expired("e1", DocumentType::Token));
    }

    #[test]
    fn test_decodes_historical_layout() {
        // No DocumentType, an extra "Type" key and the old invalidation status
        let legacy = br#"{"AppraisedValue":0,"Generated Time":"0001-01-01T00:00:00Z","Purchased Time":"0001-01-01T00:00:00Z","ID":"energy4","Latitude":1,"Longitude":1,"Owner":"","Producer":"","Status":"old","Type":"solor"}"#;
        let record = decode("energy4", legacy).unwrap();

        assert_eq!(record.document_type, DocumentType::Token);
        assert_eq!(record.status, Status::Expired);
        assert_eq!(record.latitude, 1.0);
        assert!(record.generated_time.is_none());
        assert!(record.large_category.is_empty());
    }

    #[test]
    fn test_decode_failure_names_the_key() {
        let err = decode("broken", b"{not json").unwrap_err();
        match err {
            ContractError::Decoding { key, .. } => assert_eq!(key, "broken"),
            other => panic!("unexpected error: {other:?}"),
        }

        // Status is required
        assert!(decode("nostatus", br#"{"ID":"nostatus"}"#).is_err());
    }
}
