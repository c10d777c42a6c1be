//! Database-specific error types and conversions.

use partition_core::error::PartitionError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Cannot reach store at {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Statement failed: {0}")]
    Statement(String),

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for PartitionError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => PartitionError::NotFound { entity, id },
            other => PartitionError::Store(other.to_string()),
        }
    }
}
