//! Repository trait definitions for the partition store.
//!
//! All operations are async. `save` is an upsert keyed by the entity id.
//! Reads exclude logically deleted rows unless the method name says
//! otherwise. Tenants, partitions and partition roles are deleted
//! logically; access grants, access-role rows and pages are removed
//! physically so their unique keys can be reused.

use uuid::Uuid;

use crate::error::PartitionResult;
use crate::models::{
    access::{Access, AccessRole},
    page::Page,
    partition::Partition,
    partition_role::PartitionRole,
    tenant::Tenant,
};

/// Page-number based pagination used by query operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_size: u64,
    pub page_number: u64,
}

impl Pagination {
    pub fn new(page_size: u64, page_number: u64) -> Self {
        Self {
            page_size,
            page_number,
        }
    }

    pub fn offset(&self) -> u64 {
        self.page_number * self.page_size
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_size: 50,
            page_number: 0,
        }
    }
}

pub trait TenantRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PartitionResult<Tenant>> + Send;
    /// Case-insensitive substring search over id, name and description.
    fn get_by_query(
        &self,
        query: &str,
        pagination: Pagination,
    ) -> impl Future<Output = PartitionResult<Vec<Tenant>>> + Send;
    fn save(&self, tenant: Tenant) -> impl Future<Output = PartitionResult<Tenant>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = PartitionResult<()>> + Send;
}

pub trait PartitionRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PartitionResult<Partition>> + Send;
    /// Point lookup that also returns logically deleted partitions.
    fn get_by_id_with_deleted(
        &self,
        id: Uuid,
    ) -> impl Future<Output = PartitionResult<Partition>> + Send;
    /// Case-insensitive substring search over id, tenant id, parent id,
    /// name and description, ordered by creation time.
    fn get_by_query(
        &self,
        query: &str,
        pagination: Pagination,
    ) -> impl Future<Output = PartitionResult<Vec<Partition>>> + Send;
    fn get_children(
        &self,
        parent_id: Uuid,
    ) -> impl Future<Output = PartitionResult<Vec<Partition>>> + Send;
    fn save(&self, partition: Partition)
    -> impl Future<Output = PartitionResult<Partition>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = PartitionResult<()>> + Send;

    fn get_roles(
        &self,
        partition_id: Uuid,
    ) -> impl Future<Output = PartitionResult<Vec<PartitionRole>>> + Send;
    fn get_roles_by_id(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = PartitionResult<Vec<PartitionRole>>> + Send;
    fn save_role(
        &self,
        role: PartitionRole,
    ) -> impl Future<Output = PartitionResult<PartitionRole>> + Send;
    /// Logically deletes the role and removes access-role rows that
    /// reference it.
    fn remove_role(&self, role_id: Uuid) -> impl Future<Output = PartitionResult<()>> + Send;
}

pub trait AccessRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PartitionResult<Access>> + Send;
    fn get_by_partition_and_profile(
        &self,
        partition_id: Uuid,
        profile_id: &str,
    ) -> impl Future<Output = PartitionResult<Access>> + Send;
    fn save(&self, access: Access) -> impl Future<Output = PartitionResult<Access>> + Send;
    /// Removes the grant's access-role rows, then the grant itself.
    fn delete(&self, id: Uuid) -> impl Future<Output = PartitionResult<()>> + Send;

    fn get_roles(
        &self,
        access_id: Uuid,
    ) -> impl Future<Output = PartitionResult<Vec<AccessRole>>> + Send;
    fn save_role(
        &self,
        role: AccessRole,
    ) -> impl Future<Output = PartitionResult<AccessRole>> + Send;
    fn remove_role(
        &self,
        access_role_id: Uuid,
    ) -> impl Future<Output = PartitionResult<()>> + Send;
}

pub trait PageRepository: Send + Sync {
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = PartitionResult<Page>> + Send;
    fn get_by_partition_and_name(
        &self,
        partition_id: Uuid,
        name: &str,
    ) -> impl Future<Output = PartitionResult<Page>> + Send;
    fn save(&self, page: Page) -> impl Future<Output = PartitionResult<Page>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = PartitionResult<()>> + Send;
}
