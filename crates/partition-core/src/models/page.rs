//! Page domain model: static HTML content, unique per partition and name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::state::EntityState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub partition_id: Uuid,
    pub name: String,
    pub html: String,
    pub state: EntityState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Page {
    pub fn new(input: CreatePage) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            partition_id: input.partition_id,
            name: input.name,
            html: input.html,
            state: EntityState::Created,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePage {
    pub tenant_id: Uuid,
    pub partition_id: Uuid,
    pub name: String,
    pub html: String,
}
