//! Partition Core — domain models, property bag codec, error taxonomy
//! and the storage/queue traits shared by the rest of the workspace.

pub mod error;
pub mod models;
pub mod properties;
pub mod queue;
pub mod repository;

pub use error::{PartitionError, PartitionResult};
pub use properties::{PropertyBag, PropertyValue};
