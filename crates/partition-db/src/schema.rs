//! Schema definitions and migration runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. UUIDs are stored as strings, lifecycle states
//! as strings with ASSERT constraints, and property bags as flexible
//! objects. `deleted_at` marks a logically deleted row.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Tenants
-- =======================================================================
DEFINE TABLE tenant SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE tenant TYPE string;
DEFINE FIELD name ON TABLE tenant TYPE string;
DEFINE FIELD description ON TABLE tenant TYPE string DEFAULT '';
DEFINE FIELD properties ON TABLE tenant TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD created_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tenant TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE tenant TYPE option<datetime>;

-- =======================================================================
-- Partitions (tenant scope, hierarchical)
-- =======================================================================
DEFINE TABLE partition SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE partition TYPE string;
DEFINE FIELD parent_id ON TABLE partition TYPE option<string>;
DEFINE FIELD name ON TABLE partition TYPE string;
DEFINE FIELD description ON TABLE partition TYPE string DEFAULT '';
DEFINE FIELD properties ON TABLE partition TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD client_secret ON TABLE partition TYPE option<string>;
DEFINE FIELD registry_client_id ON TABLE partition TYPE option<string>;
DEFINE FIELD state ON TABLE partition TYPE string \
    ASSERT $value IN ['Created', 'Checked', 'Active', 'Inactive', \
    'Deleted'];
DEFINE FIELD created_at ON TABLE partition TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE partition TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE partition TYPE option<datetime>;
DEFINE INDEX idx_partition_tenant ON TABLE partition COLUMNS tenant_id;
DEFINE INDEX idx_partition_parent ON TABLE partition COLUMNS parent_id;

-- =======================================================================
-- Partition Roles (partition scope)
-- =======================================================================
DEFINE TABLE partition_role SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE partition_role TYPE string;
DEFINE FIELD partition_id ON TABLE partition_role TYPE string;
DEFINE FIELD name ON TABLE partition_role TYPE string;
DEFINE FIELD properties ON TABLE partition_role TYPE object FLEXIBLE \
    DEFAULT {};
DEFINE FIELD created_at ON TABLE partition_role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE partition_role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE partition_role TYPE option<datetime>;
DEFINE INDEX idx_partition_role_partition ON TABLE partition_role \
    COLUMNS partition_id;

-- =======================================================================
-- Access grants (partition scope)
-- =======================================================================
DEFINE TABLE access SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE access TYPE string;
DEFINE FIELD partition_id ON TABLE access TYPE string;
DEFINE FIELD profile_id ON TABLE access TYPE string;
DEFINE FIELD state ON TABLE access TYPE string \
    ASSERT $value IN ['Created', 'Checked', 'Active', 'Inactive', \
    'Deleted'];
DEFINE FIELD created_at ON TABLE access TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE access TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE access TYPE option<datetime>;
DEFINE INDEX idx_access_partition_profile ON TABLE access \
    COLUMNS partition_id, profile_id UNIQUE;

-- =======================================================================
-- Access Roles (join: access -> partition_role)
-- =======================================================================
DEFINE TABLE access_role SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE access_role TYPE string;
DEFINE FIELD access_id ON TABLE access_role TYPE string;
DEFINE FIELD partition_role_id ON TABLE access_role TYPE string;
DEFINE FIELD created_at ON TABLE access_role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE access_role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_access_role_access ON TABLE access_role \
    COLUMNS access_id;
DEFINE INDEX idx_access_role_role ON TABLE access_role \
    COLUMNS partition_role_id;

-- =======================================================================
-- Pages (partition scope)
-- =======================================================================
DEFINE TABLE page SCHEMAFULL;
DEFINE FIELD tenant_id ON TABLE page TYPE string;
DEFINE FIELD partition_id ON TABLE page TYPE string;
DEFINE FIELD name ON TABLE page TYPE string;
DEFINE FIELD html ON TABLE page TYPE string;
DEFINE FIELD state ON TABLE page TYPE string \
    ASSERT $value IN ['Created', 'Checked', 'Active', 'Inactive', \
    'Deleted'];
DEFINE FIELD created_at ON TABLE page TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE page TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD deleted_at ON TABLE page TYPE option<datetime>;
DEFINE INDEX idx_page_partition_name ON TABLE page \
    COLUMNS partition_id, name UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

async fn current_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(
        version = migration.version,
        name = migration.name,
        "Applying migration"
    );

    db.query(migration.sql).await?.check().map_err(|e| {
        DbError::Migration(format!(
            "v{} '{}' failed: {e}",
            migration.version, migration.name
        ))
    })?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| {
            DbError::Migration(format!("could not record v{}: {e}", migration.version))
        })?;

    Ok(())
}

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates the `_migration` tracking table on first run, then applies
/// every migration newer than the recorded version. Safe to call on
/// every startup.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = current_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > current).collect();

    if pending.is_empty() {
        info!(version = current, "Schema is up to date");
        return Ok(());
    }

    for migration in pending {
        apply(db, migration).await?;
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
