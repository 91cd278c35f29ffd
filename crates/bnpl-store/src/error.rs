//! Error types for BNPL storage.

use bnpl_core::BnplError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of record.
        entity: &'static str,
        /// The missing key.
        id: String,
    },

    /// A uniqueness constraint was violated.
    #[error("{entity} already exists: {key}")]
    Conflict {
        /// The kind of record.
        entity: &'static str,
        /// The duplicated unique key.
        key: String,
    },
}

impl From<StoreError> for BnplError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Conflict {
                entity: "refund",
                key,
            } => Self::DuplicateTransaction {
                transaction_id: key,
            },
            StoreError::Conflict { entity, key } => {
                Self::Storage(format!("{entity} already exists: {key}"))
            }
            StoreError::Serialization(msg) => Self::Serialization(msg),
            StoreError::Database(msg) => Self::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refund_conflict_maps_to_duplicate_transaction() {
        let err: BnplError = StoreError::Conflict {
            entity: "refund",
            key: "TXN1".into(),
        }
        .into();
        assert!(matches!(
            err,
            BnplError::DuplicateTransaction { transaction_id } if transaction_id == "TXN1"
        ));
    }

    #[test]
    fn database_errors_map_to_storage() {
        let err: BnplError = StoreError::Database("disk full".into()).into();
        assert!(matches!(err, BnplError::Storage(msg) if msg == "disk full"));
    }
}
