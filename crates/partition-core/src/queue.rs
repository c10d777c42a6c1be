//! Publish/subscribe seams used by the sync dispatch.
//!
//! Messages are opaque byte payloads on a named topic; headers are not
//! interpreted.

use crate::error::PartitionResult;

pub trait Publisher: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = PartitionResult<()>> + Send;
}

/// Consumer side of a topic. An `Err` leaves the message unacknowledged
/// so the queue's redelivery policy applies.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, payload: &[u8]) -> impl Future<Output = PartitionResult<()>> + Send;
}
