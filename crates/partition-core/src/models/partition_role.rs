//! Partition role domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::properties::PropertyBag;

/// A named role scoped to a single partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartitionRole {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub partition_id: Uuid,
    pub name: String,
    pub properties: PropertyBag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl PartitionRole {
    pub fn new(input: CreatePartitionRole) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            partition_id: input.partition_id,
            name: input.name,
            properties: input.properties,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreatePartitionRole {
    pub tenant_id: Uuid,
    pub partition_id: Uuid,
    pub name: String,
    pub properties: PropertyBag,
}
