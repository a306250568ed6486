//! Adapters that bridge storage layer to domain layer.
//!
//! The domain layer (projgate-domain) defines the abstract `AccessReader`
//! trait. The storage layer (projgate-storage) implements `DataStore` with
//! concrete backends. This module implements the former over the latter.

use std::sync::Arc;

use async_trait::async_trait;

use projgate_domain::error::{DomainError, DomainResult};
use projgate_domain::model::{
    DefaultAccessQuery, PermissionFilter, ProjectId, UserId, UserProfile,
};
use projgate_domain::resolver::AccessReader;
use projgate_storage::{DataStore, StorageError};

fn storage_error(e: StorageError) -> DomainError {
    DomainError::DataAccess {
        message: format!("storage error: {}", e),
    }
}

/// Adapter that implements `AccessReader` using a `DataStore`.
pub struct DataStoreAccessReader<S: DataStore> {
    storage: Arc<S>,
}

impl<S: DataStore> DataStoreAccessReader<S> {
    /// Creates a new adapter wrapping the given storage.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}

#[async_trait]
impl<S: DataStore> AccessReader for DataStoreAccessReader<S> {
    async fn get_user_with_role_and_groups(
        &self,
        user_id: &UserId,
    ) -> DomainResult<Option<UserProfile>> {
        self.storage
            .get_user_profile(user_id)
            .await
            .map_err(storage_error)
    }

    async fn list_non_deleted_projects(&self) -> DomainResult<Vec<ProjectId>> {
        self.storage
            .list_non_deleted_projects()
            .await
            .map_err(storage_error)
    }

    async fn list_projects_created_by(&self, user_id: &UserId) -> DomainResult<Vec<ProjectId>> {
        self.storage
            .list_projects_created_by(user_id)
            .await
            .map_err(storage_error)
    }

    async fn list_user_permissions(
        &self,
        user_id: &UserId,
        filter: PermissionFilter,
    ) -> DomainResult<Vec<ProjectId>> {
        self.storage
            .list_user_permissions(user_id, filter)
            .await
            .map_err(storage_error)
    }

    async fn list_project_assignments(&self, user_id: &UserId) -> DomainResult<Vec<ProjectId>> {
        self.storage
            .list_project_assignments(user_id)
            .await
            .map_err(storage_error)
    }

    async fn list_projects_by_default_access(
        &self,
        query: DefaultAccessQuery,
    ) -> DomainResult<Vec<ProjectId>> {
        self.storage
            .list_projects_by_default_access(query)
            .await
            .map_err(storage_error)
    }
}
