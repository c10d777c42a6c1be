//! Partition domain model.
//!
//! A partition is a tenant-scoped application boundary that is mirrored
//! as an OAuth2 client in the external identity provider. Partitions form
//! a forest through `parent_id`; a parent is expected to exist under the
//! same tenant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::state::EntityState;
use crate::properties::PropertyBag;

/// Property key holding the registry client identifier.
pub const CLIENT_ID_KEY: &str = "client_id";

/// A partition. Its JSON form is the document carried on the sync topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Partition {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub properties: PropertyBag,
    /// Secret shared with the identity provider for confidential clients.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Client identifier assigned by the identity provider after the
    /// first successful sync.
    #[serde(default)]
    pub registry_client_id: Option<String>,
    #[serde(default)]
    pub state: EntityState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Partition {
    pub fn new(input: CreatePartition) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            parent_id: input.parent_id,
            name: input.name,
            description: input.description,
            properties: input.properties,
            client_secret: input.client_secret,
            registry_client_id: None,
            state: EntityState::Created,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Identifier to use for the registry client.
    ///
    /// Prefers the linked registry id, then a `client_id` property, and
    /// falls back to the partition's own id on first sync.
    pub fn client_id(&self) -> String {
        self.registry_client_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| {
                self.properties
                    .get_str(CLIENT_ID_KEY)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.id.to_string())
    }

    /// The client secret, treating an empty string as absent.
    pub fn secret(&self) -> Option<&str> {
        self.client_secret.as_deref().filter(|s| !s.is_empty())
    }
}

/// Fields required to create a new partition.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreatePartition {
    pub tenant_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub properties: PropertyBag,
    pub client_secret: Option<String>,
}

/// Fields that can be updated on an existing partition.
///
/// `properties` is merged into the stored bag rather than replacing it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePartition {
    pub name: Option<String>,
    pub description: Option<String>,
    pub properties: Option<PropertyBag>,
    pub state: Option<EntityState>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub client_secret: Option<Option<String>>,
}
