//! Integration tests for the Access and Page repositories using
//! in-memory SurrealDB.

use partition_core::error::PartitionError;
use partition_core::models::access::{Access, AccessRole, CreateAccess};
use partition_core::models::page::{CreatePage, Page};
use partition_core::models::partition::{CreatePartition, Partition};
use partition_core::models::partition_role::{CreatePartitionRole, PartitionRole};
use partition_core::models::state::EntityState;
use partition_core::repository::{AccessRepository, PageRepository, PartitionRepository};
use partition_db::repository::{
    SurrealAccessRepository, SurrealPageRepository, SurrealPartitionRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = surrealdb::engine::local::Db;

struct Fixture {
    db: Surreal<Db>,
    tenant_id: Uuid,
    partition: Partition,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    partition_db::run_migrations(&db).await.unwrap();

    let tenant_id = Uuid::new_v4();
    let partition = SurrealPartitionRepository::new(db.clone())
        .save(Partition::new(CreatePartition {
            tenant_id,
            name: "Shop".into(),
            ..Default::default()
        }))
        .await
        .unwrap();

    Fixture {
        db,
        tenant_id,
        partition,
    }
}

fn grant(fx: &Fixture, profile_id: &str) -> Access {
    Access::new(CreateAccess {
        tenant_id: fx.tenant_id,
        partition_id: fx.partition.id,
        profile_id: profile_id.into(),
    })
}

#[tokio::test]
async fn access_lookup_by_partition_and_profile() {
    let fx = setup().await;
    let repo = SurrealAccessRepository::new(fx.db.clone());

    let access = repo.save(grant(&fx, "profile-1")).await.unwrap();
    assert_eq!(access.state, EntityState::Created);

    let found = repo
        .get_by_partition_and_profile(fx.partition.id, "profile-1")
        .await
        .unwrap();
    assert_eq!(found.id, access.id);

    let err = repo
        .get_by_partition_and_profile(fx.partition.id, "profile-2")
        .await
        .unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
}

#[tokio::test]
async fn deleting_access_removes_its_roles_and_frees_the_profile() {
    let fx = setup().await;
    let repo = SurrealAccessRepository::new(fx.db.clone());
    let partitions = SurrealPartitionRepository::new(fx.db.clone());

    let role = partitions
        .save_role(PartitionRole::new(CreatePartitionRole {
            tenant_id: fx.tenant_id,
            partition_id: fx.partition.id,
            name: "member".into(),
            ..Default::default()
        }))
        .await
        .unwrap();

    let access = repo.save(grant(&fx, "profile-1")).await.unwrap();
    repo.save_role(AccessRole::new(fx.tenant_id, access.id, role.id))
        .await
        .unwrap();
    assert_eq!(repo.get_roles(access.id).await.unwrap().len(), 1);

    repo.delete(access.id).await.unwrap();

    let err = repo.get_by_id(access.id).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
    assert!(repo.get_roles(access.id).await.unwrap().is_empty());

    // The same profile can be granted again once revoked.
    let again = repo.save(grant(&fx, "profile-1")).await.unwrap();
    assert_ne!(again.id, access.id);

    let err = repo.delete(access.id).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_grant_for_profile_is_rejected() {
    let fx = setup().await;
    let repo = SurrealAccessRepository::new(fx.db.clone());

    repo.save(grant(&fx, "profile-1")).await.unwrap();
    let err = repo.save(grant(&fx, "profile-1")).await.unwrap_err();
    assert!(matches!(err, PartitionError::Store(_)));
}

#[tokio::test]
async fn access_role_can_be_removed_individually() {
    let fx = setup().await;
    let repo = SurrealAccessRepository::new(fx.db.clone());

    let access = repo.save(grant(&fx, "profile-1")).await.unwrap();
    let first = repo
        .save_role(AccessRole::new(fx.tenant_id, access.id, Uuid::new_v4()))
        .await
        .unwrap();
    let second = repo
        .save_role(AccessRole::new(fx.tenant_id, access.id, Uuid::new_v4()))
        .await
        .unwrap();

    repo.remove_role(first.id).await.unwrap();

    let remaining = repo.get_roles(access.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, second.id);

    let err = repo.remove_role(first.id).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
}

#[tokio::test]
async fn page_lookup_and_delete() {
    let fx = setup().await;
    let repo = SurrealPageRepository::new(fx.db.clone());

    let page = repo
        .save(Page::new(CreatePage {
            tenant_id: fx.tenant_id,
            partition_id: fx.partition.id,
            name: "login".into(),
            html: "<h1>Sign in</h1>".into(),
        }))
        .await
        .unwrap();

    let fetched = repo.get_by_id(page.id).await.unwrap();
    assert_eq!(fetched.html, "<h1>Sign in</h1>");

    let by_name = repo
        .get_by_partition_and_name(fx.partition.id, "login")
        .await
        .unwrap();
    assert_eq!(by_name.id, page.id);

    let err = repo
        .get_by_partition_and_name(fx.partition.id, "consent")
        .await
        .unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));

    repo.delete(page.id).await.unwrap();
    let err = repo.get_by_id(page.id).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));

    let err = repo.delete(page.id).await.unwrap_err();
    assert!(matches!(err, PartitionError::NotFound { .. }));
}

#[tokio::test]
async fn page_save_updates_html() {
    let fx = setup().await;
    let repo = SurrealPageRepository::new(fx.db.clone());

    let mut page = repo
        .save(Page::new(CreatePage {
            tenant_id: fx.tenant_id,
            partition_id: fx.partition.id,
            name: "login".into(),
            html: "v1".into(),
        }))
        .await
        .unwrap();

    page.html = "v2".into();
    repo.save(page.clone()).await.unwrap();

    let fetched = repo
        .get_by_partition_and_name(fx.partition.id, "login")
        .await
        .unwrap();
    assert_eq!(fetched.html, "v2");
}
