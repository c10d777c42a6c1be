//! Error types for the partition service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Registry rejected request with status {status}: {body}")]
    Registry { status: u16, body: String },

    #[error("Registry unreachable: {0}")]
    RegistryTransport(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PartitionError {
    /// Whether redelivering the same message could succeed.
    ///
    /// Missing records and undecodable input fail identically on every
    /// attempt, so the queue should drop them rather than spin.
    pub fn is_retryable(&self) -> bool {
        match self {
            PartitionError::Store(_)
            | PartitionError::Registry { .. }
            | PartitionError::RegistryTransport(_)
            | PartitionError::Queue(_) => true,
            PartitionError::NotFound { .. }
            | PartitionError::MalformedInput(_)
            | PartitionError::Internal(_) => false,
        }
    }
}

pub type PartitionResult<T> = Result<T, PartitionError>;
