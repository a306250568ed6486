//! Traits for data access needed by the resolver.

use async_trait::async_trait;

use crate::error::DomainResult;
use crate::model::{DefaultAccessQuery, PermissionFilter, ProjectId, UserId, UserProfile};

/// Read-only queries the resolver issues against the application's data layer.
///
/// Unless stated otherwise every query returns only projects that are not
/// deleted. Implementations should return ids in a stable order; the resolver
/// preserves that order within each source.
#[async_trait]
pub trait AccessReader: Send + Sync {
    /// Fetches the user with global role and group memberships.
    ///
    /// Each group's permissions must already exclude deleted projects.
    /// Returns `Ok(None)` when the user does not exist.
    async fn get_user_with_role_and_groups(
        &self,
        user_id: &UserId,
    ) -> DomainResult<Option<UserProfile>>;

    /// Lists every non-deleted project.
    async fn list_non_deleted_projects(&self) -> DomainResult<Vec<ProjectId>>;

    /// Lists non-deleted projects created by the user.
    async fn list_projects_created_by(&self, user_id: &UserId) -> DomainResult<Vec<ProjectId>>;

    /// Lists projects for which the user has an explicit permission row passing `filter`.
    ///
    /// Deleted projects are dropped only when [`PermissionFilter::excludes_deleted`]
    /// is true; the denial lookup sees every row.
    async fn list_user_permissions(
        &self,
        user_id: &UserId,
        filter: PermissionFilter,
    ) -> DomainResult<Vec<ProjectId>>;

    /// Lists non-deleted projects the user is directly assigned to.
    async fn list_project_assignments(&self, user_id: &UserId) -> DomainResult<Vec<ProjectId>>;

    /// Lists non-deleted projects whose default policy matches `query`.
    async fn list_projects_by_default_access(
        &self,
        query: DefaultAccessQuery,
    ) -> DomainResult<Vec<ProjectId>>;
}
