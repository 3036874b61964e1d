//! Timestamp handling for persisted records.
//!
//! Records carry RFC 3339 timestamps in UTC. An unset timestamp is written as
//! the zero instant `0001-01-01T00:00:00Z`, which is what the ledger has always
//! stored for a missing time, and reads back as `None`.
//!
//! Nothing in here samples a clock. Every instant comes from the caller.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::ContractError;

/// Persisted form of an unset timestamp
pub const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

/// Unix seconds of `0001-01-01T00:00:00Z`
const ZERO_TIME_UNIX_SECONDS: i64 = -62_135_596_800;

/// Render an instant the way it is stored
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Whether `time` is the zero instant used to mark "no timestamp"
pub fn is_zero_time(time: &DateTime<Utc>) -> bool {
    time.timestamp() == ZERO_TIME_UNIX_SECONDS && time.timestamp_subsec_nanos() == 0
}

/// Parse an RFC 3339 timestamp, normalised to UTC
pub fn parse_time(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|t| t.with_timezone(&Utc))
}

/// Parse a caller-supplied reference time
pub fn parse_reference_time(raw: &str) -> Result<DateTime<Utc>, ContractError> {
    parse_time(raw.trim()).map_err(|e| {
        ContractError::InvalidArgument(format!("reference time {:?} is not RFC 3339: {}", raw, e))
    })
}

/// Serde adapter for `Option<DateTime<Utc>>` fields using the zero-instant convention
pub mod optional_ledger_time {
    use super::{format_time, is_zero_time, parse_time, ZERO_TIME};
    use chrono::{DateTime, Utc};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&format_time(time)),
            None => serializer.serialize_str(ZERO_TIME),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }

        let time = parse_time(&raw).map_err(|e| D::Error::custom(format!("{:?}: {}", raw, e)))?;
        if is_zero_time(&time) {
            Ok(None)
        } else {
            Ok(Some(time))
        }
    }
}
