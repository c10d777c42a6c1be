//! Integration tests for the Partition repository (partitions and
//! partition roles) using in-memory SurrealDB.

use chrono::{Duration, Utc};
use partition_core::error::PartitionError;
use partition_core::models::access::{Access, AccessRole, CreateAccess};
use partition_core::models::partition::{CreatePartition, Partition};
use partition_core::models::partition_role::{CreatePartitionRole, PartitionRole};
use partition_core::models::state::EntityState;
use partition_core::models::tenant::{CreateTenant, Tenant};
use partition_core::properties::{PropertyBag, PropertyValue};
use partition_core::repository::{
    AccessRepository, Pagination, PartitionRepository, TenantRepository,
};
use partition_db::repository::{
    SurrealAccessRepository, SurrealPartitionRepository, SurrealTenantRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

/// Helper: spin up in-memory DB, run migrations, create a tenant.
async fn setup() -> (Surreal<Db>, SurrealPartitionRepository<Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    partition_db::run_migrations(&db).await.unwrap();

    let tenant = SurrealTenantRepository::new(db.clone())
        .save(Tenant::new(CreateTenant {
            name: "Test Tenant".into(),
            ..Default::default()
        }))
        .await
        .unwrap();

    let repo = SurrealPartitionRepository::new(db.clone());
    (db, repo, tenant.id)
}

fn partition(tenant_id: Uuid, name: &str) -> Partition {
    Partition::new(CreatePartition {
        tenant_id,
        name: name.into(),
        description: format!("{name} partition"),
        ..Default::default()
    })
}

#[tokio::test]
async fn save_and_get_partition() {
    let (_db, repo, tenant_id) = setup().await;

    let mut p = partition(tenant_id, "Shop");
    p.properties.insert("redirect_uris", "https://a/cb,https://b/cb");
    p.properties.insert("logo_uri", "https://a/logo.png");
    p.client_secret = Some("s3cret".into());

    let saved = repo.save(p.clone()).await.unwrap();
    assert_eq!(saved.id, p.id);
    assert_eq!(saved.tenant_id, tenant_id);
    assert_eq!(saved.state, EntityState::Created);
    assert_eq!(saved.client_secret.as_deref(), Some("s3cret"));

    let fetched = repo.get_by_id(p.id).await.unwrap();
    assert_eq!(fetched.name, "Shop");
    assert_eq!(
        fetched.properties.get("redirect_uris"),
        Some(&PropertyValue::List(vec![
            "https://a/cb".into(),
            "https://b/cb".into()
        ]))
    );
    assert_eq!(
        fetched.properties.get_str("logo_uri"),
        Some("https://a/logo.png")
    );
    assert_eq!(fetched.registry_client_id, None);
    assert!(!fetched.is_deleted());
}

#[tokio::test]
async fn save_is_an_upsert() {
    let (_db, repo, tenant_id) = setup().await;
    let mut p = repo.save(partition(tenant_id, "Before")).await.unwrap();

    p.name = "After".into();
    p.registry_client_id = Some("client-1".into());
    p.properties.insert("client_id", "client-1");
    repo.save(p.clone()).await.unwrap();

    let fetched = repo.get_by_id(p.id).await.unwrap();
    assert_eq!(fetched.name, "After");
    assert_eq!(fetched.registry_client_id.as_deref(), Some("client-1"));
    assert_eq!(fetched.properties.get_str("client_id"), Some("client-1"));

    let all = repo.get_by_query("", Pagination::new(10, 0)).await.unwrap();
    assert_eq!(all.len(), 1, "upsert must not duplicate the row");
}

#[tokio::test]
async fn get_missing_partition_is_not_found() {
    let (_db, repo, _tenant_id) = setup().await;
    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
}

#[tokio::test]
async fn get_children_returns_direct_children_only() {
    let (_db, repo, tenant_id) = setup().await;

    let root = repo.save(partition(tenant_id, "Root")).await.unwrap();

    let mut child = partition(tenant_id, "Child");
    child.parent_id = Some(root.id);
    let child = repo.save(child).await.unwrap();

    let mut grandchild = partition(tenant_id, "Grandchild");
    grandchild.parent_id = Some(child.id);
    repo.save(grandchild).await.unwrap();

    let children = repo.get_children(root.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child.id);
    assert_eq!(children[0].parent_id, Some(root.id));
}

#[tokio::test]
async fn soft_deleted_partition_is_hidden_but_loadable() {
    let (_db, repo, tenant_id) = setup().await;

    let root = repo.save(partition(tenant_id, "Root")).await.unwrap();
    let mut child = partition(tenant_id, "Child");
    child.parent_id = Some(root.id);
    let child = repo.save(child).await.unwrap();

    repo.delete(child.id).await.unwrap();

    let err = repo.get_by_id(child.id).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
    assert!(repo.get_children(root.id).await.unwrap().is_empty());
    let listed = repo.get_by_query("", Pagination::new(10, 0)).await.unwrap();
    assert_eq!(listed.len(), 1);

    let deleted = repo.get_by_id_with_deleted(child.id).await.unwrap();
    assert!(deleted.is_deleted());
    assert_eq!(deleted.state, EntityState::Deleted);

    let err = repo.delete(child.id).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
}

#[tokio::test]
async fn with_deleted_lookup_still_reports_unknown_ids() {
    let (_db, repo, _tenant_id) = setup().await;
    let err = repo.get_by_id_with_deleted(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
}

#[tokio::test]
async fn query_matches_every_searchable_column() {
    let (_db, repo, tenant_id) = setup().await;

    let parent = repo.save(partition(tenant_id, "Payments")).await.unwrap();
    let mut child = partition(tenant_id, "Ledger");
    child.parent_id = Some(parent.id);
    child.description = "Holds the GENERAL journal".into();
    let child = repo.save(child).await.unwrap();

    let page = Pagination::new(10, 0);

    let by_name = repo.get_by_query("PAYMENTS", page).await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].id, parent.id);

    let by_description = repo.get_by_query("general", page).await.unwrap();
    assert_eq!(by_description.len(), 1);
    assert_eq!(by_description[0].id, child.id);

    let by_id = repo
        .get_by_query(&child.id.to_string(), page)
        .await
        .unwrap();
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].id, child.id);

    // The parent id matches the parent by id and the child by parent_id.
    let by_parent = repo
        .get_by_query(&parent.id.to_string(), page)
        .await
        .unwrap();
    assert_eq!(by_parent.len(), 2);

    let by_tenant = repo
        .get_by_query(&tenant_id.to_string(), page)
        .await
        .unwrap();
    assert_eq!(by_tenant.len(), 2);

    assert!(repo.get_by_query("nomatch", page).await.unwrap().is_empty());
}

#[tokio::test]
async fn query_pages_are_disjoint_and_contiguous() {
    let (_db, repo, tenant_id) = setup().await;

    let base = Utc::now() - Duration::hours(1);
    let mut expected = Vec::new();
    for i in 0..150 {
        let mut p = partition(tenant_id, &format!("Partition {i:03}"));
        p.created_at = base + Duration::milliseconds(i * 10);
        expected.push(p.id);
        repo.save(p).await.unwrap();
    }

    let first = repo.get_by_query("", Pagination::new(100, 0)).await.unwrap();
    let second = repo.get_by_query("", Pagination::new(100, 1)).await.unwrap();

    assert_eq!(first.len(), 100);
    assert_eq!(second.len(), 50);

    let actual: Vec<Uuid> = first.iter().chain(second.iter()).map(|p| p.id).collect();
    assert_eq!(actual, expected);

    let third = repo.get_by_query("", Pagination::new(100, 2)).await.unwrap();
    assert!(third.is_empty());
}

#[tokio::test]
async fn pages_stay_disjoint_when_timestamps_tie() {
    let (_db, repo, tenant_id) = setup().await;

    let created_at = Utc::now() - Duration::hours(1);
    let mut expected = Vec::new();
    for i in 0..25 {
        let mut p = partition(tenant_id, &format!("Tied {i:02}"));
        p.created_at = created_at;
        expected.push(p.id);
        repo.save(p).await.unwrap();
    }

    let mut seen = Vec::new();
    for page in 0..3 {
        let rows = repo
            .get_by_query("", Pagination::new(10, page))
            .await
            .unwrap();
        seen.extend(rows.into_iter().map(|p| p.id));
    }

    assert_eq!(seen.len(), 25);
    let mut sorted = seen.clone();
    sorted.sort_by_key(|id| id.to_string());
    assert_eq!(seen, sorted);

    expected.sort_by_key(|id| id.to_string());
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn roles_round_trip() {
    let (_db, repo, tenant_id) = setup().await;
    let p = repo.save(partition(tenant_id, "Shop")).await.unwrap();

    let admin = repo
        .save_role(PartitionRole::new(CreatePartitionRole {
            tenant_id,
            partition_id: p.id,
            name: "admin".into(),
            properties: PropertyBag::from_iter([("level", "high")]),
        }))
        .await
        .unwrap();
    let viewer = repo
        .save_role(PartitionRole::new(CreatePartitionRole {
            tenant_id,
            partition_id: p.id,
            name: "viewer".into(),
            properties: PropertyBag::new(),
        }))
        .await
        .unwrap();

    let roles = repo.get_roles(p.id).await.unwrap();
    assert_eq!(roles.len(), 2);

    let by_id = repo.get_roles_by_id(&[viewer.id]).await.unwrap();
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].name, "viewer");

    assert!(repo.get_roles_by_id(&[]).await.unwrap().is_empty());

    let fetched = repo.get_roles_by_id(&[admin.id]).await.unwrap();
    assert_eq!(fetched[0].properties.get_str("level"), Some("high"));
}

#[tokio::test]
async fn removing_a_role_drops_its_access_assignments() {
    let (db, repo, tenant_id) = setup().await;
    let access_repo = SurrealAccessRepository::new(db);

    let p = repo.save(partition(tenant_id, "Shop")).await.unwrap();
    let role = repo
        .save_role(PartitionRole::new(CreatePartitionRole {
            tenant_id,
            partition_id: p.id,
            name: "admin".into(),
            properties: PropertyBag::new(),
        }))
        .await
        .unwrap();

    let access = access_repo
        .save(Access::new(CreateAccess {
            tenant_id,
            partition_id: p.id,
            profile_id: "profile-1".into(),
        }))
        .await
        .unwrap();
    access_repo
        .save_role(AccessRole::new(tenant_id, access.id, role.id))
        .await
        .unwrap();

    repo.remove_role(role.id).await.unwrap();

    assert!(repo.get_roles(p.id).await.unwrap().is_empty());
    assert!(access_repo.get_roles(access.id).await.unwrap().is_empty());

    let err = repo.remove_role(role.id).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
}
