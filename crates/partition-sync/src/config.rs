//! Synchronization configuration.

use url::Url;

use crate::error::SyncError;

/// Configuration for the sync engine and dispatch.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the identity provider's admin API (e.g.
    /// `http://hydra:4445`). Client URLs are built beneath it.
    pub registry_admin_url: String,
    /// Topic carrying partition documents for reconciliation.
    pub sync_topic: String,
    /// Page size used when enumerating partitions at startup.
    pub reconcile_page_size: u64,
    /// Whether startup republishes every partition.
    pub synchronize_primary_partitions: bool,
    /// Timeout applied to each registry call, in seconds.
    pub registry_timeout_secs: u64,
}

impl SyncConfig {
    /// Collection URL, `{base}/clients`.
    pub fn clients_url(&self) -> Result<String, SyncError> {
        self.registry_url(&["clients"])
    }

    /// Client-specific URL, `{base}/clients/{client_id}`. The id is
    /// percent-encoded as a single path segment.
    pub fn client_url(&self, client_id: &str) -> Result<String, SyncError> {
        if matches!(client_id, "" | "." | "..") {
            return Err(SyncError::InvalidClientId(client_id.to_string()));
        }
        self.registry_url(&["clients", client_id])
    }

    fn registry_url(&self, segments: &[&str]) -> Result<String, SyncError> {
        let invalid = |reason: String| SyncError::InvalidAdminUrl {
            url: self.registry_admin_url.clone(),
            reason,
        };

        let mut url = Url::parse(&self.registry_admin_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            registry_admin_url: "http://localhost:4445".into(),
            sync_topic: "partition_sync_hydra".into(),
            reconcile_page_size: 100,
            synchronize_primary_partitions: true,
            registry_timeout_secs: 30,
        }
    }
}
