//! SurrealDB implementation of [`PartitionRepository`].
//!
//! Partitions and partition roles are deleted logically. Removing a role
//! also removes the `access_role` rows that reference it so no grant is
//! left pointing at a deleted role.

use chrono::{DateTime, Utc};
use partition_core::error::PartitionResult;
use partition_core::models::partition::Partition;
use partition_core::models::partition_role::PartitionRole;
use partition_core::properties::PropertyBag;
use partition_core::repository::{Pagination, PartitionRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{parse_optional_uuid, parse_state, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PartitionRow {
    record_id: String,
    tenant_id: String,
    parent_id: Option<String>,
    name: String,
    description: String,
    properties: serde_json::Value,
    client_secret: Option<String>,
    registry_client_id: Option<String>,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl PartitionRow {
    fn try_into_partition(self) -> Result<Partition, DbError> {
        Ok(Partition {
            id: parse_uuid("record", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            parent_id: parse_optional_uuid("parent", self.parent_id)?,
            name: self.name,
            description: self.description,
            properties: PropertyBag::from_json_value(self.properties),
            client_secret: self.client_secret,
            registry_client_id: self.registry_client_id,
            state: parse_state(&self.state)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct PartitionRoleRow {
    record_id: String,
    tenant_id: String,
    partition_id: String,
    name: String,
    properties: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl PartitionRoleRow {
    fn try_into_role(self) -> Result<PartitionRole, DbError> {
        Ok(PartitionRole {
            id: parse_uuid("record", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            partition_id: parse_uuid("partition", &self.partition_id)?,
            name: self.name,
            properties: PropertyBag::from_json_value(self.properties),
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

fn into_partitions(rows: Vec<PartitionRow>) -> Result<Vec<Partition>, DbError> {
    rows.into_iter()
        .map(PartitionRow::try_into_partition)
        .collect()
}

fn into_roles(rows: Vec<PartitionRoleRow>) -> Result<Vec<PartitionRole>, DbError> {
    rows.into_iter().map(PartitionRoleRow::try_into_role).collect()
}

/// SurrealDB implementation of the Partition repository.
#[derive(Clone)]
pub struct SurrealPartitionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPartitionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch(&self, id: Uuid, include_deleted: bool) -> PartitionResult<Partition> {
        let id_str = id.to_string();
        let query = if include_deleted {
            "SELECT meta::id(id) AS record_id, * FROM type::record('partition', $id)"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM type::record('partition', $id) \
             WHERE deleted_at = NONE"
        };

        let mut result = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PartitionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("partition", id_str))?;

        Ok(row.try_into_partition()?)
    }
}

impl<C: Connection> PartitionRepository for SurrealPartitionRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> PartitionResult<Partition> {
        self.fetch(id, false).await
    }

    async fn get_by_id_with_deleted(&self, id: Uuid) -> PartitionResult<Partition> {
        self.fetch(id, true).await
    }

    async fn get_by_query(
        &self,
        query: &str,
        pagination: Pagination,
    ) -> PartitionResult<Vec<Partition>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM partition \
                 WHERE deleted_at = NONE AND ( \
                     $search = '' \
                     OR string::contains(string::lowercase(meta::id(id)), $search) \
                     OR string::contains(string::lowercase(tenant_id), $search) \
                     OR string::contains(string::lowercase(parent_id ?? ''), $search) \
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

        let rows: Vec<PartitionRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_partitions(rows)?)
    }

    async fn get_children(&self, parent_id: Uuid) -> PartitionResult<Vec<Partition>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM partition \
                 WHERE parent_id = $parent_id AND deleted_at = NONE \
                 ORDER BY created_at ASC, record_id ASC",
            )
            .bind(("parent_id", parent_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PartitionRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_partitions(rows)?)
    }

    async fn save(&self, partition: Partition) -> PartitionResult<Partition> {
        let id_str = partition.id.to_string();

        // Statement 0 is the UPSERT, statement 1 reads the row back with
        // its record id.
        let result = self
            .db
            .query(
                "UPSERT type::record('partition', $id) SET \
                 tenant_id = $tenant_id, parent_id = $parent_id, \
                 name = $name, description = $description, \
                 properties = $properties, \
                 client_secret = $client_secret, \
                 registry_client_id = $registry_client_id, \
                 state = $state, \
                 created_at = $created_at, \
                 updated_at = time::now(), \
                 deleted_at = $deleted_at; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('partition', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", partition.tenant_id.to_string()))
            .bind(("parent_id", partition.parent_id.map(|p| p.to_string())))
            .bind(("name", partition.name))
            .bind(("description", partition.description))
            .bind(("properties", partition.properties.to_json_value()))
            .bind(("client_secret", partition.client_secret))
            .bind(("registry_client_id", partition.registry_client_id))
            .bind(("state", partition.state.as_str()))
            .bind(("created_at", partition.created_at))
            .bind(("deleted_at", partition.deleted_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let rows: Vec<PartitionRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("partition", &id_str))?;

        debug!(partition_id = %id_str, "Saved partition");
        Ok(row.try_into_partition()?)
    }

    async fn delete(&self, id: Uuid) -> PartitionResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('partition', $id) SET \
                 state = 'Deleted', \
                 deleted_at = time::now(), updated_at = time::now() \
                 WHERE deleted_at = NONE \
                 RETURN id",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<surrealdb_types::Value> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("partition", id_str).into());
        }

        Ok(())
    }

    async fn get_roles(&self, partition_id: Uuid) -> PartitionResult<Vec<PartitionRole>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM partition_role \
                 WHERE partition_id = $partition_id AND deleted_at = NONE \
                 ORDER BY created_at ASC, record_id ASC",
            )
            .bind(("partition_id", partition_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PartitionRoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_roles(rows)?)
    }

    async fn get_roles_by_id(&self, ids: &[Uuid]) -> PartitionResult<Vec<PartitionRole>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM partition_role \
                 WHERE meta::id(id) IN $ids AND deleted_at = NONE \
                 ORDER BY created_at ASC, record_id ASC",
            )
            .bind(("ids", ids))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PartitionRoleRow> = result.take(0).map_err(DbError::from)?;
        Ok(into_roles(rows)?)
    }

    async fn save_role(&self, role: PartitionRole) -> PartitionResult<PartitionRole> {
        let id_str = role.id.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('partition_role', $id) SET \
                 tenant_id = $tenant_id, partition_id = $partition_id, \
                 name = $name, properties = $properties, \
                 created_at = $created_at, \
                 updated_at = time::now(), \
                 deleted_at = $deleted_at; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('partition_role', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", role.tenant_id.to_string()))
            .bind(("partition_id", role.partition_id.to_string()))
            .bind(("name", role.name))
            .bind(("properties", role.properties.to_json_value()))
            .bind(("created_at", role.created_at))
            .bind(("deleted_at", role.deleted_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let rows: Vec<PartitionRoleRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("partition_role", &id_str))?;

        Ok(row.try_into_role()?)
    }

    async fn remove_role(&self, role_id: Uuid) -> PartitionResult<()> {
        let id_str = role_id.to_string();

        // Join rows go first so no grant references a deleted role.
        let result = self
            .db
            .query(
                "DELETE access_role WHERE partition_role_id = $id; \
                 UPDATE type::record('partition_role', $id) SET \
                 deleted_at = time::now(), updated_at = time::now() \
                 WHERE deleted_at = NONE \
                 RETURN id;",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let rows: Vec<surrealdb_types::Value> = result.take(1).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("partition_role", id_str).into());
        }

        Ok(())
    }
}
