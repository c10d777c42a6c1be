//! In-process publish/subscribe queue.
//!
//! Each topic is an unbounded tokio channel with a single subscriber.
//! Delivery is at-least-once: a message whose handler fails with a
//! retryable error is put back on the topic until it has been delivered
//! `max_deliveries` times.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use partition_core::error::{PartitionError, PartitionResult};
use partition_core::queue::{MessageHandler, Publisher};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

struct Delivery {
    payload: Vec<u8>,
    attempt: u32,
}

struct Topic {
    tx: mpsc::UnboundedSender<Delivery>,
    rx: Option<mpsc::UnboundedReceiver<Delivery>>,
}

impl Topic {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx: Some(rx) }
    }
}

/// Redelivery policy for a subscriber.
#[derive(Debug, Clone, Copy)]
pub struct SubscriberConfig {
    /// Total delivery attempts per message, including the first.
    pub max_deliveries: u32,
    /// Delay before a failed message is put back on the topic.
    pub retry_delay: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            max_deliveries: 5,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Cloneable handle to a set of in-process topics.
#[derive(Clone)]
pub struct InProcessQueue {
    topics: Arc<Mutex<HashMap<String, Topic>>>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Default for InProcessQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessQueue {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            shutdown: Arc::new(shutdown),
        }
    }

    /// Stop every running subscriber. Messages still queued are dropped.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    fn sender(&self, topic: &str) -> PartitionResult<mpsc::UnboundedSender<Delivery>> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|_| PartitionError::Queue("topic registry poisoned".into()))?;
        Ok(topics
            .entry(topic.to_string())
            .or_insert_with(Topic::new)
            .tx
            .clone())
    }

    fn take_receiver(
        &self,
        topic: &str,
    ) -> PartitionResult<(
        mpsc::UnboundedSender<Delivery>,
        mpsc::UnboundedReceiver<Delivery>,
    )> {
        let mut topics = self
            .topics
            .lock()
            .map_err(|_| PartitionError::Queue("topic registry poisoned".into()))?;
        let entry = topics.entry(topic.to_string()).or_insert_with(Topic::new);
        let rx = entry
            .rx
            .take()
            .ok_or_else(|| PartitionError::Queue(format!("topic {topic} already has a subscriber")))?;
        Ok((entry.tx.clone(), rx))
    }

    /// Feed every message on `topic` to `handler` until [`shutdown`] is
    /// called.
    ///
    /// [`shutdown`]: InProcessQueue::shutdown
    pub async fn run_subscriber<H: MessageHandler>(
        &self,
        topic: &str,
        handler: H,
        config: SubscriberConfig,
    ) -> PartitionResult<()> {
        let (tx, mut rx) = self.take_receiver(topic)?;
        let mut shutdown = self.shutdown.subscribe();
        let stopped = *shutdown.borrow();
        if stopped {
            return Ok(());
        }

        debug!(topic, "Subscriber started");
        loop {
            let delivery = tokio::select! {
                _ = shutdown.changed() => break,
                next = rx.recv() => match next {
                    Some(delivery) => delivery,
                    None => break,
                },
            };

            let Err(err) = handler.handle(&delivery.payload).await else {
                continue;
            };

            if err.is_retryable() && delivery.attempt < config.max_deliveries {
                warn!(
                    topic,
                    attempt = delivery.attempt,
                    error = %err,
                    "Message handling failed, redelivering"
                );
                let tx = tx.clone();
                let retry = Delivery {
                    payload: delivery.payload,
                    attempt: delivery.attempt + 1,
                };
                let delay = config.retry_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // A closed channel means the subscriber is gone.
                    let _ = tx.send(retry);
                });
            } else {
                error!(
                    topic,
                    attempt = delivery.attempt,
                    error = %err,
                    "Message dropped"
                );
            }
        }

        debug!(topic, "Subscriber stopped");
        Ok(())
    }
}

impl Publisher for InProcessQueue {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> PartitionResult<()> {
        self.sender(topic)?
            .send(Delivery {
                payload,
                attempt: 1,
            })
            .map_err(|_| PartitionError::Queue(format!("topic {topic} is closed")))
    }
}
