//! Sync dispatch: the sync-topic consumer and startup reconciliation.

use partition_core::error::{PartitionError, PartitionResult};
use partition_core::models::partition::Partition;
use partition_core::queue::{MessageHandler, Publisher};
use partition_core::repository::{Pagination, PartitionRepository};
use tracing::{debug, info, warn};

use crate::engine::{SyncEngine, SyncOutcome};
use crate::error::SyncError;
use crate::registry::RegistryClient;

/// Consumes partition documents from the sync topic and runs the engine.
///
/// An error leaves the message unacknowledged; redelivery is up to the
/// queue.
pub struct PartitionSyncHandler<P: PartitionRepository, R: RegistryClient> {
    engine: SyncEngine<P, R>,
}

impl<P: PartitionRepository, R: RegistryClient> PartitionSyncHandler<P, R> {
    pub fn new(engine: SyncEngine<P, R>) -> Self {
        Self { engine }
    }
}

impl<P: PartitionRepository, R: RegistryClient> MessageHandler for PartitionSyncHandler<P, R> {
    async fn handle(&self, payload: &[u8]) -> PartitionResult<()> {
        let partition = decode_partition(payload)?;
        let partition_id = partition.id;

        match self.engine.sync(partition).await {
            Ok(outcome) => {
                let action = match outcome {
                    SyncOutcome::Deleted => "deleted",
                    SyncOutcome::Created(_) => "created",
                    SyncOutcome::Updated(_) => "updated",
                };
                debug!(partition_id = %partition_id, action, "Sync message handled");
                Ok(())
            }
            Err(err) => {
                warn!(partition_id = %partition_id, error = %err, "Partition sync failed");
                Err(err)
            }
        }
    }
}

/// Decode a sync-topic message body.
pub fn decode_partition(payload: &[u8]) -> PartitionResult<Partition> {
    serde_json::from_slice(payload).map_err(|e| SyncError::Decode(e.to_string()).into())
}

/// Encode a partition as a sync-topic message body.
pub fn encode_partition(partition: &Partition) -> PartitionResult<Vec<u8>> {
    serde_json::to_vec(partition).map_err(|e| SyncError::Encode(e.to_string()).into())
}

/// Republish every live partition to `topic`, one page at a time.
///
/// Any enumeration or publish failure aborts the pass. Returns the number
/// of partitions published.
pub async fn reconcile_partitions<P, Q>(
    partitions: &P,
    publisher: &Q,
    topic: &str,
    page_size: u64,
) -> PartitionResult<usize>
where
    P: PartitionRepository,
    Q: Publisher,
{
    if page_size == 0 {
        return Err(PartitionError::MalformedInput(
            "reconciliation page size must be positive".into(),
        ));
    }

    let mut published = 0;
    let mut page_number = 0;
    loop {
        let page = partitions
            .get_by_query("", Pagination::new(page_size, page_number))
            .await?;
        let fetched = page.len();

        for partition in &page {
            publisher.publish(topic, encode_partition(partition)?).await?;
        }
        published += fetched;

        if (fetched as u64) < page_size {
            break;
        }
        page_number += 1;
    }

    info!(topic, published, "Partition reconciliation published");
    Ok(published)
}
