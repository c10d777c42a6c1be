//! Startup error types.

use partition_core::error::PartitionError;
use partition_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid value for {key}: {reason}")]
    Config { key: String, reason: String },

    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Partition(#[from] PartitionError),
}
