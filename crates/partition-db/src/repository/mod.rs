//! SurrealDB repository implementations.

mod access;
mod page;
mod partition;
mod tenant;

pub use access::SurrealAccessRepository;
pub use page::SurrealPageRepository;
pub use partition::SurrealPartitionRepository;
pub use tenant::SurrealTenantRepository;

use partition_core::models::state::EntityState;
use uuid::Uuid;

use crate::error::DbError;

pub(crate) fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {field} UUID: {e}")))
}

pub(crate) fn parse_optional_uuid(field: &str, raw: Option<String>) -> Result<Option<Uuid>, DbError> {
    raw.filter(|s| !s.is_empty())
        .map(|s| parse_uuid(field, &s))
        .transpose()
}

pub(crate) fn parse_state(raw: &str) -> Result<EntityState, DbError> {
    raw.parse().map_err(DbError::Decode)
}
