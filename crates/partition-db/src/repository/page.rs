//! SurrealDB implementation of [`PageRepository`].

use chrono::{DateTime, Utc};
use partition_core::error::PartitionResult;
use partition_core::models::page::Page;
use partition_core::repository::PageRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::{parse_state, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct PageRow {
    record_id: String,
    tenant_id: String,
    partition_id: String,
    name: String,
    html: String,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl PageRow {
    fn try_into_page(self) -> Result<Page, DbError> {
        Ok(Page {
            id: parse_uuid("record", &self.record_id)?,
            tenant_id: parse_uuid("tenant", &self.tenant_id)?,
            partition_id: parse_uuid("partition", &self.partition_id)?,
            name: self.name,
            html: self.html,
            state: parse_state(&self.state)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        })
    }
}

/// SurrealDB implementation of the Page repository.
#[derive(Clone)]
pub struct SurrealPageRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPageRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn first(&self, query: &str, binds: Vec<(&'static str, String)>, missing: String) -> PartitionResult<Page> {
        let mut builder = self.db.query(query);
        for bind in binds {
            builder = builder.bind(bind);
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<PageRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("page", missing))?;

        Ok(row.try_into_page()?)
    }
}

impl<C: Connection> PageRepository for SurrealPageRepository<C> {
    async fn get_by_id(&self, id: Uuid) -> PartitionResult<Page> {
        self.first(
            "SELECT meta::id(id) AS record_id, * FROM type::record('page', $id) \
             WHERE deleted_at = NONE",
            vec![("id", id.to_string())],
            id.to_string(),
        )
        .await
    }

    async fn get_by_partition_and_name(&self, partition_id: Uuid, name: &str) -> PartitionResult<Page> {
        self.first(
            "SELECT meta::id(id) AS record_id, * FROM page \
             WHERE partition_id = $partition_id AND name = $name \
             AND deleted_at = NONE",
            vec![
                ("partition_id", partition_id.to_string()),
                ("name", name.to_string()),
            ],
            format!("partition={partition_id},name={name}"),
        )
        .await
    }

    async fn save(&self, page: Page) -> PartitionResult<Page> {
        let id_str = page.id.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('page', $id) SET \
                 tenant_id = $tenant_id, partition_id = $partition_id, \
                 name = $name, html = $html, state = $state, \
                 created_at = $created_at, \
                 updated_at = time::now(), \
                 deleted_at = $deleted_at; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('page', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", page.tenant_id.to_string()))
            .bind(("partition_id", page.partition_id.to_string()))
            .bind(("name", page.name))
            .bind(("html", page.html))
            .bind(("state", page.state.as_str()))
            .bind(("created_at", page.created_at))
            .bind(("deleted_at", page.deleted_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Statement(e.to_string()))?;

        let rows: Vec<PageRow> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("page", &id_str))?;

        Ok(row.try_into_page()?)
    }

    async fn delete(&self, id: Uuid) -> PartitionResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("DELETE type::record('page', $id) RETURN BEFORE")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<surrealdb_types::Value> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("page", id_str).into());
        }

        Ok(())
    }
}
