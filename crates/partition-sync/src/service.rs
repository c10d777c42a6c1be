//! Partition service: the business operations behind the transport.
//!
//! Partition mutations are persisted first and then published to the
//! sync topic; the registry is only touched by the sync consumer.

use partition_core::error::{PartitionError, PartitionResult};
use partition_core::models::access::{Access, AccessRole, CreateAccess};
use partition_core::models::page::{CreatePage, Page};
use partition_core::models::partition::{CreatePartition, Partition, UpdatePartition};
use partition_core::models::partition_role::{CreatePartitionRole, PartitionRole};
use partition_core::models::tenant::{CreateTenant, Tenant};
use partition_core::queue::Publisher;
use partition_core::repository::{
    AccessRepository, PageRepository, Pagination, PartitionRepository, TenantRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::dispatch::encode_partition;

/// Generic over repository and publisher implementations so the service
/// has no dependency on the database crate.
pub struct PartitionService<T, P, A, G, Q>
where
    T: TenantRepository,
    P: PartitionRepository,
    A: AccessRepository,
    G: PageRepository,
    Q: Publisher,
{
    tenants: T,
    partitions: P,
    access: A,
    pages: G,
    publisher: Q,
    sync_topic: String,
}

impl<T, P, A, G, Q> PartitionService<T, P, A, G, Q>
where
    T: TenantRepository,
    P: PartitionRepository,
    A: AccessRepository,
    G: PageRepository,
    Q: Publisher,
{
    pub fn new(
        tenants: T,
        partitions: P,
        access: A,
        pages: G,
        publisher: Q,
        sync_topic: impl Into<String>,
    ) -> Self {
        Self {
            tenants,
            partitions,
            access,
            pages,
            publisher,
            sync_topic: sync_topic.into(),
        }
    }

    async fn publish(&self, partition: &Partition) -> PartitionResult<()> {
        self.publisher
            .publish(&self.sync_topic, encode_partition(partition)?)
            .await
    }

    // -----------------------------------------------------------------
    // Tenants
    // -----------------------------------------------------------------

    pub async fn create_tenant(&self, input: CreateTenant) -> PartitionResult<Tenant> {
        let tenant = self.tenants.save(Tenant::new(input)).await?;
        info!(tenant_id = %tenant.id, "Tenant created");
        Ok(tenant)
    }

    pub async fn get_tenant(&self, id: Uuid) -> PartitionResult<Tenant> {
        self.tenants.get_by_id(id).await
    }

    pub async fn list_tenants(
        &self,
        query: &str,
        pagination: Pagination,
    ) -> PartitionResult<Vec<Tenant>> {
        self.tenants.get_by_query(query, pagination).await
    }

    // -----------------------------------------------------------------
    // Partitions
    // -----------------------------------------------------------------

    /// Create a partition under an existing tenant and queue it for sync.
    ///
    /// A parent, when given, must exist under the same tenant.
    pub async fn create_partition(&self, input: CreatePartition) -> PartitionResult<Partition> {
        self.tenants.get_by_id(input.tenant_id).await?;

        if let Some(parent_id) = input.parent_id {
            let parent = self.partitions.get_by_id(parent_id).await?;
            if parent.tenant_id != input.tenant_id {
                return Err(PartitionError::MalformedInput(format!(
                    "parent partition {parent_id} belongs to another tenant"
                )));
            }
        }

        let partition = self.partitions.save(Partition::new(input)).await?;
        self.publish(&partition).await?;

        info!(
            partition_id = %partition.id,
            tenant_id = %partition.tenant_id,
            "Partition created"
        );
        Ok(partition)
    }

    pub async fn get_partition(&self, id: Uuid) -> PartitionResult<Partition> {
        self.partitions.get_by_id(id).await
    }

    pub async fn list_partitions(
        &self,
        query: &str,
        pagination: Pagination,
    ) -> PartitionResult<Vec<Partition>> {
        self.partitions.get_by_query(query, pagination).await
    }

    pub async fn get_children(&self, parent_id: Uuid) -> PartitionResult<Vec<Partition>> {
        self.partitions.get_children(parent_id).await
    }

    /// Apply `input`, merging properties into the stored bag, and queue
    /// the result for sync.
    pub async fn update_partition(
        &self,
        id: Uuid,
        input: UpdatePartition,
    ) -> PartitionResult<Partition> {
        let mut partition = self.partitions.get_by_id(id).await?;

        if let Some(name) = input.name {
            partition.name = name;
        }
        if let Some(description) = input.description {
            partition.description = description;
        }
        if let Some(properties) = input.properties {
            partition.properties.merge(properties);
        }
        if let Some(state) = input.state {
            partition.state = state;
        }
        if let Some(secret) = input.client_secret {
            partition.client_secret = secret;
        }

        let partition = self.partitions.save(partition).await?;
        self.publish(&partition).await?;

        info!(partition_id = %partition.id, "Partition updated");
        Ok(partition)
    }

    /// Soft-delete a partition and queue the deleted document so its
    /// registry client is removed.
    pub async fn remove_partition(&self, id: Uuid) -> PartitionResult<()> {
        self.partitions.delete(id).await?;
        let deleted = self.partitions.get_by_id_with_deleted(id).await?;
        self.publish(&deleted).await?;

        info!(partition_id = %id, "Partition removed");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Partition roles
    // -----------------------------------------------------------------

    pub async fn create_partition_role(
        &self,
        input: CreatePartitionRole,
    ) -> PartitionResult<PartitionRole> {
        let partition = self.partitions.get_by_id(input.partition_id).await?;
        let role = PartitionRole::new(CreatePartitionRole {
            tenant_id: partition.tenant_id,
            ..input
        });
        self.partitions.save_role(role).await
    }

    pub async fn list_partition_roles(
        &self,
        partition_id: Uuid,
    ) -> PartitionResult<Vec<PartitionRole>> {
        self.partitions.get_roles(partition_id).await
    }

    pub async fn remove_partition_role(&self, role_id: Uuid) -> PartitionResult<()> {
        self.partitions.remove_role(role_id).await
    }

    // -----------------------------------------------------------------
    // Access
    // -----------------------------------------------------------------

    /// Grant `profile_id` access to a partition. Granting twice returns
    /// the existing grant.
    pub async fn create_access(
        &self,
        partition_id: Uuid,
        profile_id: &str,
    ) -> PartitionResult<Access> {
        let partition = self.partitions.get_by_id(partition_id).await?;

        match self
            .access
            .get_by_partition_and_profile(partition_id, profile_id)
            .await
        {
            Ok(existing) => return Ok(existing),
            Err(PartitionError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        self.access
            .save(Access::new(CreateAccess {
                tenant_id: partition.tenant_id,
                partition_id,
                profile_id: profile_id.to_string(),
            }))
            .await
    }

    pub async fn get_access(&self, partition_id: Uuid, profile_id: &str) -> PartitionResult<Access> {
        self.access
            .get_by_partition_and_profile(partition_id, profile_id)
            .await
    }

    pub async fn remove_access(&self, access_id: Uuid) -> PartitionResult<()> {
        self.access.delete(access_id).await
    }

    /// Assign a role of the grant's own partition to an access grant.
    pub async fn create_access_role(
        &self,
        access_id: Uuid,
        partition_role_id: Uuid,
    ) -> PartitionResult<AccessRole> {
        let access = self.access.get_by_id(access_id).await?;
        let role = self
            .partitions
            .get_roles_by_id(&[partition_role_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PartitionError::NotFound {
                entity: "partition_role".into(),
                id: partition_role_id.to_string(),
            })?;

        if role.partition_id != access.partition_id {
            return Err(PartitionError::MalformedInput(format!(
                "role {partition_role_id} does not belong to partition {}",
                access.partition_id
            )));
        }

        self.access
            .save_role(AccessRole::new(access.tenant_id, access.id, role.id))
            .await
    }

    /// Role assignments of a grant, each paired with its role.
    pub async fn list_access_roles(
        &self,
        access_id: Uuid,
    ) -> PartitionResult<Vec<(AccessRole, PartitionRole)>> {
        let assignments = self.access.get_roles(access_id).await?;
        let role_ids: Vec<Uuid> = assignments.iter().map(|a| a.partition_role_id).collect();
        let roles = self.partitions.get_roles_by_id(&role_ids).await?;

        Ok(assignments
            .into_iter()
            .filter_map(|assignment| {
                roles
                    .iter()
                    .find(|role| role.id == assignment.partition_role_id)
                    .cloned()
                    .map(|role| (assignment, role))
            })
            .collect())
    }

    pub async fn remove_access_role(&self, access_role_id: Uuid) -> PartitionResult<()> {
        self.access.remove_role(access_role_id).await
    }

    // -----------------------------------------------------------------
    // Pages
    // -----------------------------------------------------------------

    pub async fn create_page(&self, input: CreatePage) -> PartitionResult<Page> {
        let partition = self.partitions.get_by_id(input.partition_id).await?;
        self.pages
            .save(Page::new(CreatePage {
                tenant_id: partition.tenant_id,
                ..input
            }))
            .await
    }

    pub async fn get_page(&self, partition_id: Uuid, name: &str) -> PartitionResult<Page> {
        self.pages.get_by_partition_and_name(partition_id, name).await
    }

    pub async fn remove_page(&self, page_id: Uuid) -> PartitionResult<()> {
        self.pages.delete(page_id).await
    }
}
