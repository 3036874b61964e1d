use thiserror::Error;

/// Represents all possible errors raised by a world-state backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// Errors that occur with the underlying storage backend
    #[error("Database error: {0}")]
    Database(String),

    /// Stored keys or values the backend cannot represent
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors that don't fit in other categories
    #[error("Other error: {0}")]
    Other(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

/// Errors surfaced by contract operations.
///
/// Every variant is terminal for the call that produced it. Nothing is retried
/// and nothing is written once one of these has been returned.
#[derive(Error, Debug)]
pub enum ContractError {
    /// The world state could not be read or written
    #[error("failed to access world state: {0}")]
    Access(#[from] StorageError),

    #[error("the energy {id} does not exist")]
    NotFound { id: String },

    #[error("the energy {id} already exists")]
    AlreadyExists { id: String },

    #[error("the energy {id} was generated more than {window_minutes}min ago")]
    SaleWindowExpired { id: String, window_minutes: i64 },

    #[error("the energy {id} is not for sale")]
    NotForSale { id: String },

    /// A record could not be serialized; indicates a defect, not bad input
    #[error("failed to encode {id}: {source}")]
    Encoding {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored bytes under `key` do not parse as a record
    #[error("failed to decode record stored under {key}: {source}")]
    Decoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown contract function: {0}")]
    UnknownFunction(String),
}

impl ContractError {
    pub fn not_found(id: impl Into<String>) -> Self {
        ContractError::NotFound { id: id.into() }
    }

    pub fn already_exists(id: impl Into<String>) -> Self {
        ContractError::AlreadyExists { id: id.into() }
    }

    pub fn not_for_sale(id: impl Into<String>) -> Self {
        ContractError::NotForSale { id: id.into() }
    }

    /// True for errors caused by the caller's request rather than by storage or data corruption
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ContractError::NotFound { .. }
                | ContractError::AlreadyExists { .. }
                | ContractError::SaleWindowExpired { .. }
                | ContractError::NotForSale { .. }
                | ContractError::InvalidArgument(_)
                | ContractError::UnknownFunction(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_identifier() {
        let err = ContractError::SaleWindowExpired {
            id: "energy7".to_string(),
            window_minutes: 30,
        };
        assert_eq!(
            err.to_string(),
            "the energy energy7 was generated more than 30min ago"
        );
        assert_eq!(
            ContractError::not_found("missing").to_string(),
            "the energy missing does not exist"
        );
        assert_eq!(
            ContractError::already_exists("e1").to_string(),
            "the energy e1 already exists"
        );
    }

    #[test]
    fn test_storage_errors_are_not_rejections() {
        let err: ContractError = StorageError::Database("disk full".to_string()).into();
        assert!(!err.is_rejection());
        assert!(ContractError::not_for_sale("e1").is_rejection());
    }
}
