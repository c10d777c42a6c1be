//! Synchronization error types.

use partition_core::error::PartitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid redirect URI {uri:?}: {reason}")]
    InvalidRedirectUri { uri: String, reason: String },

    #[error("client id {0:?} cannot be used as a URL path segment")]
    InvalidClientId(String),

    #[error("invalid registry admin URL {url:?}: {reason}")]
    InvalidAdminUrl { url: String, reason: String },

    #[error("registry returned status {status}")]
    RegistryStatus { status: u16, body: String },

    #[error("registry response is not a JSON object: {0}")]
    UnexpectedResponse(String),

    #[error("registry request failed: {0}")]
    Transport(String),

    #[error("undecodable sync message: {0}")]
    Decode(String),

    #[error("could not encode sync message: {0}")]
    Encode(String),
}

impl From<SyncError> for PartitionError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::InvalidRedirectUri { .. }
            | SyncError::InvalidClientId(_)
            | SyncError::Decode(_) => {
                PartitionError::MalformedInput(err.to_string())
            }
            SyncError::RegistryStatus { status, body } => PartitionError::Registry { status, body },
            // A 2xx with a body we cannot fold back is still a registry fault.
            SyncError::UnexpectedResponse(reason) => PartitionError::Registry {
                status: 200,
                body: reason,
            },
            SyncError::Transport(msg) => PartitionError::RegistryTransport(msg),
            SyncError::InvalidAdminUrl { .. } => PartitionError::Internal(err.to_string()),
            SyncError::Encode(msg) => PartitionError::Internal(msg),
        }
    }
}
