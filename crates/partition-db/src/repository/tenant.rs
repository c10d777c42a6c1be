//! SurrealDB implementation of [`TenantRepository`].

use chrono::{DateTime, Utc};
use partition_core::error::PartitionResult;
use partition_core::models::tenant::Tenant;
use partition_core::properties::PropertyBag;
use partition_core::repository::{Pagination, TenantRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TenantRow {
    tenant_id: String,
    name: String,
    description: String,
    properties: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            name: self.name,
            description: self.description,
            properties: PropertyBag::from_json_value(self.properties),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    tenant_id: String,
    name: String,
    description: String,
    properties: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        TenantRow {
            tenant_id: self.tenant_id,
            name: self.name,
            description: self.description,
            properties: self.properties,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
        .into_tenant(id)
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> PartitionResult<Tenant> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('tenant', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("tenant", &id_str))?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_query(&self, query: &str, pagination: Pagination) -> PartitionResult<Vec<Tenant>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 WHERE deleted_at = NONE AND ( \
                     $search = '' \
                     OR string::contains(string::lowercase(meta::id(id)), $search) \
                     OR string::contains(string::lowercase(name), $search) \
                     OR string::contains(string::lowercase(description), $search) \
                 ) \
                 ORDER BY created_at ASC, record_id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("search", query.trim().to_lowercase()))
            .bind(("limit", pagination.page_size))
            .bind(("offset", pagination.offset()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(TenantRowWithId::try_into_tenant)
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn save(&self, tenant: Tenant) -> PartitionResult<Tenant> {
        let id_str = tenant.id.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('tenant', $id) SET \
                 tenant_id = $tenant_id, \
                 name = $name, description = $description, \
                 properties = $properties, \
                 created_at = $created_at, \
                 updated_at = time::now(), \
                 deleted_at = $deleted_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", tenant.tenant_id.to_string()))
            .bind(("name", tenant.name))
            .bind(("description", tenant.description))
            .bind(("properties", tenant.properties.to_json_value()))
            .bind(("created_at", tenant.created_at))
            .bind(("deleted_at", tenant.deleted_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("tenant", &id_str))?;

        Ok(row.into_tenant(tenant.id)?)
    }

    async fn delete(&self, id: Uuid) -> PartitionResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('tenant', $id) \
                 SET deleted_at = time::now(), updated_at = time::now() \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("tenant", id_str).into());
        }

        Ok(())
    }
}
