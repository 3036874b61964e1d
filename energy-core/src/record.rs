use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ContractError;
use crate::time::optional_ledger_time;

/// Discriminates tokens from cost reference entries sharing the keyspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// A tradeable unit of generated energy
    #[default]
    Token,
    /// A per-category unit-cost reference entry
    Cost,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Token => "token",
            DocumentType::Cost => "cost",
        }
    }
}

/// Sale status of a record.
///
/// Moves only forward: `Generated -> Sold` by a transfer, or
/// `Generated | Sold -> Expired` by invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Generated,
    Sold,
    /// Earlier ledgers wrote invalidated records with the status "old"
    #[serde(alias = "old")]
    Expired,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Generated => "generated",
            Status::Sold => "sold",
            Status::Expired => "expired",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generated" => Ok(Status::Generated),
            "sold" => Ok(Status::Sold),
            "expired" | "old" => Ok(Status::Expired),
            other => Err(ContractError::InvalidArgument(format!(
                "unknown status {:?}",
                other
            ))),
        }
    }
}

/// Caller-supplied details for issuing a new token
#[derive(Debug, Clone, PartialEq)]
pub struct TokenIssue {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub producer: String,
    pub large_category: String,
    pub small_category: String,
    /// Defaults to 0 when not supplied
    pub appraised_value: Option<i64>,
}

impl TokenIssue {
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        producer: impl Into<String>,
        large_category: impl Into<String>,
        small_category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            producer: producer.into(),
            large_category: large_category.into(),
            small_category: small_category.into(),
            appraised_value: None,
        }
    }

    pub fn with_appraised_value(mut self, value: i64) -> Self {
        self.appraised_value = Some(value);
        self
    }

    /// Reject coordinates the persisted format cannot carry
    pub fn validate(&self) -> Result<(), ContractError> {
        for (name, value) in [("latitude", self.latitude), ("longitude", self.longitude)] {
            if !value.is_finite() {
                return Err(ContractError::InvalidArgument(format!(
                    "{} of {} must be finite, got {}",
                    name, self.id, value
                )));
            }
        }
        Ok(())
    }
}

/// A single keyed entity in the world state.
///
/// Fields are declared in byte-wise alphabetical order of their persisted key
/// names. The codec relies on that order for byte-identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    #[serde(rename = "AppraisedValue", default)]
    pub appraised_value: i64,

    #[serde(rename = "DocumentType", default)]
    pub document_type: DocumentType,

    #[serde(rename = "Generated Time", default, with = "optional_ledger_time")]
    pub generated_time: Option<DateTime<Utc>>,

    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "LargeCategory", default)]
    pub large_category: String,

    #[serde(rename = "Latitude", default)]
    pub latitude: f64,

    #[serde(rename = "Longitude", default)]
    pub longitude: f64,

    #[serde(rename = "Owner", default)]
    pub owner: String,

    #[serde(rename = "Producer", default)]
    pub producer: String,

    #[serde(rename = "Purchased Time", default, with = "optional_ledger_time")]
    pub purchased_time: Option<DateTime<Utc>>,

    #[serde(rename = "SmallCategory", default)]
    pub small_category: String,

    #[serde(rename = "Status")]
    pub status: Status,
}

impl EnergyRecord {
    /// Issue a freshly generated token owned by its producer
    pub fn token(issue: &TokenIssue, generated_time: DateTime<Utc>) -> Self {
        Self {
            appraised_value: issue.appraised_value.unwrap_or(0),
            document_type: DocumentType::Token,
            generated_time: Some(generated_time),
            id: issue.id.clone(),
            large_category: issue.large_category.clone(),
            latitude: issue.latitude,
            longitude: issue.longitude,
            owner: issue.producer.clone(),
            producer: issue.producer.clone(),
            purchased_time: None,
            small_category: issue.small_category.clone(),
            status: Status::Generated,
        }
    }

    /// Cost reference entry for a category, keyed by a descriptive slug
    pub fn cost(
        slug: impl Into<String>,
        large_category: impl Into<String>,
        small_category: impl Into<String>,
        unit_cost: i64,
    ) -> Self {
        Self {
            appraised_value: unit_cost,
            document_type: DocumentType::Cost,
            generated_time: None,
            id: slug.into(),
            large_category: large_category.into(),
            latitude: 0.0,
            longitude: 0.0,
            owner: String::new(),
            producer: String::new(),
            purchased_time: None,
            small_category: small_category.into(),
            status: Status::Generated,
        }
    }

    /// The minimal record left behind by invalidation: only the identifier,
    /// the document type and `Status = Expired` survive.
    pub fn expired(id: impl Into<String>, document_type: DocumentType) -> Self {
        Self {
            appraised_value: 0,
            document_type,
            generated_time: None,
            id: id.into(),
            large_category: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            owner: String::new(),
            producer: String::new(),
            purchased_time: None,
            small_category: String::new(),
            status: Status::Expired,
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(self.document_type, DocumentType::Token)
    }

    pub fn is_cost(&self) -> bool {
        matches!(self.document_type, DocumentType::Cost)
    }

    /// Tokens are for sale only while still in the `Generated` status
    pub fn is_for_sale(&self) -> bool {
        self.is_token() && self.status == Status::Generated
    }

    /// First instant at which the token is no longer eligible for sale
    pub fn sale_deadline(&self, window: Duration) -> Option<DateTime<Utc>> {
        self.generated_time
            .and_then(|generated| generated.checked_add_signed(window))
    }

    /// Half-open eligibility check: `reference_time < generated_time + window`.
    ///
    /// A record without a generation time is never inside the window.
    pub fn within_sale_window(&self, reference_time: DateTime<Utc>, window: Duration) -> bool {
        match self.sale_deadline(window) {
            Some(deadline) => reference_time < deadline,
            None => false,
        }
    }
}
