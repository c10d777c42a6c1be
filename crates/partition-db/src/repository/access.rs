//! SurrealDB implementation of [`AccessRepository`].
//!
//! Access grants and their role assignments are removed physically: the
//! `(partition_id, profile_id)` unique index must let a profile be
//! granted again after revocation.

use chrono::{DateTime, Utc};
use partition_core::error::PartitionResult;
use partition_core::models::access::{Access, AccessRole};
use partition_core::repository::AccessRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_state, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AccessRow {
    record_id: String,
    tenant_id: String,
    partition_id: String,
    profile_id: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl AccessRow {
    fn try_into_access(self) -> Result<Access, DbError> {
        Ok(Access {
            id: parse_uuid("record", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            partition_id: parse_uuid("partition", &self.partition_id)?,
            profile_id: self.profile_id,
            state: parse_state(&self.state)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct AccessRoleRow {
    record_id: String,
    tenant_id: String,
    access_id: String,
    partition_role_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccessRoleRow {
    fn try_into_access_role(self) -> Result<AccessRole, DbError> {
        Ok(AccessRole {
            id: parse_uuid("record", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            access_id: parse_uuid("access", &self.access_id)?,
            partition_role_id: parse_uuid("partition role", &self.partition_role_id)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Access repository.
#[derive(Clone)]
pub struct SurrealAccessRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAccessRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AccessRepository for SurrealAccessRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> PartitionResult<Access> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('access', $id) \
                 WHERE deleted_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("access", id_str))?;

        Ok(row.try_into_access()?)
    }

    async fn get_by_partition_and_profile(
        &self,
        partition_id: Uuid,
        profile_id: &str,
    ) -> PartitionResult<Access> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM access \
                 WHERE partition_id = $partition_id AND profile_id = $profile_id \
                 AND deleted_at = NONE",
            )
            .bind(("partition_id", partition_id.to_string()))
            .bind(("profile_id", profile_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| {
            DbError::not_found("access", format!("partition={partition_id},profile={profile_id}"))
        })?;

        Ok(row.try_into_access()?)
    }

    async fn save(&self, access: Access) -> PartitionResult<Access> {
        let id_str = access.id.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('access', $id) SET \
                 tenant_id = $tenant_id, partition_id = $partition_id, \
                 profile_id = $profile_id, state = $state, \
                 created_at = $created_at, \
                 updated_at = time::now(), \
                 deleted_at = $deleted_at; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('access', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", access.tenant_id.to_string()))
            .bind(("partition_id", access.partition_id.to_string()))
            .bind(("profile_id", access.profile_id))
            .bind(("state", access.state.as_str()))
            .bind(("created_at", access.created_at))
            .bind(("deleted_at", access.deleted_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let rows: Vec<AccessRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("access", &id_str))?;

        Ok(row.try_into_access()?)
    }

    async fn delete(&self, id: Uuid) -> PartitionResult<()> {
        let id_str = id.to_string();

        // Join rows first, then the grant itself.
        let result = self
            .db
            .query(
                "DELETE access_role WHERE access_id = $id; \
                 DELETE type::record('access', $id) RETURN BEFORE;",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let rows: Vec<surrealdb_types::Value> = result.take(1).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("access", id_str).into());
        }

        Ok(())
    }

    async fn get_roles(&self, access_id: Uuid) -> PartitionResult<Vec<AccessRole>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM access_role \
                 WHERE access_id = $access_id \
                 ORDER BY created_at ASC, record_id ASC",
            )
            .bind(("access_id", access_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AccessRoleRow> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(AccessRoleRow::try_into_access_role)
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }

    async fn save_role(&self, role: AccessRole) -> PartitionResult<AccessRole> {
        let id_str = role.id.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('access_role', $id) SET \
                 tenant_id = $tenant_id, access_id = $access_id, \
                 partition_role_id = $partition_role_id, \
                 created_at = $created_at, \
                 updated_at = time::now(); \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('access_role', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", role.tenant_id.to_string()))
            .bind(("access_id", role.access_id.to_string()))
            .bind(("partition_role_id", role.partition_role_id.to_string()))
            .bind(("created_at", role.created_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let rows: Vec<AccessRoleRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("access_role", &id_str))?;

        Ok(row.try_into_access_role()?)
    }

    async fn remove_role(&self, access_role_id: Uuid) -> PartitionResult<()> {
        let id_str = access_role_id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('access_role', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<surrealdb_types::Value> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("access_role", id_str).into());
        }

        Ok(())
    }
}
