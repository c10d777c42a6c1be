//! Server configuration loaded from the environment.

use std::str::FromStr;

use partition_db::DbConfig;
use partition_sync::SyncConfig;

use crate::error::ServerError;

/// Everything the server needs to wire its components.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub sync: SyncConfig,
}

impl ServerConfig {
    /// Read the process environment. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let mut config = Self::default();

        let db = &mut config.db;
        set_string(&lookup, "DATABASE_URL", &mut db.url);
        set_string(&lookup, "DATABASE_NAMESPACE", &mut db.namespace);
        set_string(&lookup, "DATABASE_NAME", &mut db.database);
        set_string(&lookup, "DATABASE_USERNAME", &mut db.username);
        set_string(&lookup, "DATABASE_PASSWORD", &mut db.password);

        let sync = &mut config.sync;
        set_string(&lookup, "OAUTH2_SERVICE_ADMIN_URI", &mut sync.registry_admin_url);
        set_string(&lookup, "QUEUE_PARTITION_SYNC_NAME", &mut sync.sync_topic);
        set_parsed(
            &lookup,
            "SYNCHRONIZE_PRIMARY_PARTITIONS",
            &mut sync.synchronize_primary_partitions,
        )?;
        set_parsed(&lookup, "REGISTRY_TIMEOUT_SECS", &mut sync.registry_timeout_secs)?;

        Ok(config)
    }
}

fn set_string(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut String) {
    if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
        *target = value;
    }
}

fn set_parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> Result<(), ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key).filter(|v| !v.trim().is_empty()) else {
        return Ok(());
    };
    *target = raw.trim().parse().map_err(|e: T::Err| ServerError::Config {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}
