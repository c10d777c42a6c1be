//! Access grant domain models.
//!
//! An [`Access`] gives one external profile visibility into exactly one
//! partition. [`AccessRole`] rows join grants to partition roles and are
//! removed physically together with their grant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::state::EntityState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Access {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub partition_id: Uuid,
    /// External profile identifier; unique per partition.
    pub profile_id: String,
    pub state: EntityState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Access {
    pub fn new(input: CreateAccess) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            partition_id: input.partition_id,
            profile_id: input.profile_id,
            state: EntityState::Created,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccess {
    pub tenant_id: Uuid,
    pub partition_id: Uuid,
    pub profile_id: String,
}

/// Assignment of a partition role to an access grant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessRole {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub access_id: Uuid,
    pub partition_role_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AccessRole {
    pub fn new(tenant_id: Uuid, access_id: Uuid, partition_role_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            access_id,
            partition_role_id,
            created_at: now,
            updated_at: now,
        }
    }
}
