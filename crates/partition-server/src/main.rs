//! Partition server: application entry point.
//!
//! Connects the store, runs migrations, starts the sync-topic consumer
//! and, when enabled, republishes every partition for reconciliation.

mod config;
mod error;

use std::time::Duration;

use partition_db::repository::SurrealPartitionRepository;
use partition_db::DbManager;
use partition_sync::{
    HttpRegistryClient, InProcessQueue, PartitionSyncHandler, SubscriberConfig, SyncEngine,
    reconcile_partitions,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::error::ServerError;

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("partition=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!("Starting partition server...");

    if let Err(e) = run().await {
        error!(error = %e, "Partition server failed");
        std::process::exit(1);
    }

    info!("Partition server stopped.");
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::from_env()?;

    let db = DbManager::open(&config.db).await?;

    let registry = HttpRegistryClient::new(Duration::from_secs(
        config.sync.registry_timeout_secs,
    ))?;
    let engine = SyncEngine::new(
        SurrealPartitionRepository::new(db.client().clone()),
        registry,
        config.sync.clone(),
    );

    let queue = InProcessQueue::new();
    let subscriber = queue.clone();
    let topic = config.sync.sync_topic.clone();
    let consumer = tokio::spawn(async move {
        subscriber
            .run_subscriber(
                &topic,
                PartitionSyncHandler::new(engine),
                SubscriberConfig::default(),
            )
            .await
    });

    if config.sync.synchronize_primary_partitions {
        let partitions = SurrealPartitionRepository::new(db.client().clone());
        // A failed pass is retried on the next start.
        if let Err(e) = reconcile_partitions(
            &partitions,
            &queue,
            &config.sync.sync_topic,
            config.sync.reconcile_page_size,
        )
        .await
        {
            error!(error = %e, "Startup reconciliation aborted");
        }
    }

    info!(topic = %config.sync.sync_topic, "Partition server ready");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }

    info!("Shutting down");
    queue.shutdown();
    match consumer.await {
        Ok(result) => result?,
        Err(e) => error!(error = %e, "Sync consumer task panicked"),
    }

    Ok(())
}
