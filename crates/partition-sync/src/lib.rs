//! Partition sync — mirrors partitions into the identity provider's
//! client registry, plus the business operations that feed it.

pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod queue;
pub mod registry;
pub mod service;

pub use config::SyncConfig;
pub use dispatch::{PartitionSyncHandler, reconcile_partitions};
pub use engine::{SyncEngine, SyncOutcome};
pub use error::SyncError;
pub use queue::{InProcessQueue, SubscriberConfig};
pub use registry::{HttpRegistryClient, Method, RegistryClient, RegistryResponse};
pub use service::PartitionService;
