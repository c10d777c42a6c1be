//! Tenant domain model.
//!
//! Tenants are the top-level owners of partitions. A tenant's identity
//! never changes once created and it is only ever logically deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::properties::PropertyBag;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tenant {
    pub id: Uuid,
    /// A tenant owns itself; kept for a uniform base record.
    pub tenant_id: Uuid,
    pub name: String,
    pub description: String,
    pub properties: PropertyBag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Tenant {
    pub fn new(input: CreateTenant) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            id,
            tenant_id: id,
            name: input.name,
            description: input.description,
            properties: input.properties,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Fields required to create a new tenant.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreateTenant {
    pub name: String,
    pub description: String,
    pub properties: PropertyBag,
}
