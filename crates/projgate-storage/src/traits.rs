//! DataStore trait definition.

use async_trait::async_trait;

use projgate_domain::model::{
    AccessType, DefaultAccessQuery, GroupId, PermissionFilter, Project, ProjectId, RoleId,
    SystemAccessLevel, UserId, UserProfile,
};

use crate::error::{StorageError, StorageResult};

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub id: UserId,
    pub system_access: SystemAccessLevel,
    pub role_id: Option<RoleId>,
}

impl StoredUser {
    /// Creates a regular user without a global role.
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            system_access: SystemAccessLevel::User,
            role_id: None,
        }
    }

    pub fn with_system_access(mut self, level: SystemAccessLevel) -> Self {
        self.system_access = level;
        self
    }

    pub fn with_role(mut self, role_id: RoleId) -> Self {
        self.role_id = Some(role_id);
        self
    }
}

/// Group metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredGroup {
    pub id: GroupId,
    pub name: String,
}

impl StoredGroup {
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Validates a user id (must be non-blank).
pub fn validate_user_id(user_id: &UserId) -> StorageResult<()> {
    if user_id.is_blank() {
        return Err(StorageError::InvalidInput {
            message: "user id cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Validates a group name (must be non-blank).
pub fn validate_group_name(name: &str) -> StorageResult<()> {
    if name.trim().is_empty() {
        return Err(StorageError::InvalidInput {
            message: "group name cannot be empty".to_string(),
        });
    }
    Ok(())
}

/// Abstract storage interface for access data.
///
/// Implementations must be thread-safe (Send + Sync) and support async
/// operations. Read queries return project ids in ascending id order.
#[async_trait]
pub trait DataStore: Send + Sync + 'static {
    // User operations

    /// Creates or replaces a user.
    async fn upsert_user(&self, user: StoredUser) -> StorageResult<()>;

    /// Gets a user by id.
    async fn get_user(&self, user_id: &UserId) -> StorageResult<StoredUser>;

    /// Deletes a user with their permissions, assignments and memberships.
    ///
    /// Projects created by the user are kept.
    async fn delete_user(&self, user_id: &UserId) -> StorageResult<()>;

    // Project operations

    /// Creates or replaces a project. The creator must exist.
    async fn upsert_project(&self, project: Project) -> StorageResult<()>;

    /// Gets a project by id, deleted or not.
    async fn get_project(&self, project_id: ProjectId) -> StorageResult<Project>;

    /// Marks a project as deleted.
    async fn soft_delete_project(&self, project_id: ProjectId) -> StorageResult<()>;

    // Per-user permission operations

    /// Sets the user's permission on a project, replacing any existing row.
    async fn set_user_permission(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
        access_type: AccessType,
    ) -> StorageResult<()>;

    /// Removes the user's permission row on a project, if any.
    async fn remove_user_permission(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
    ) -> StorageResult<()>;

    /// Directly assigns the user to a project.
    async fn add_project_assignment(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
    ) -> StorageResult<()>;

    /// Removes a direct assignment, if any.
    async fn remove_project_assignment(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
    ) -> StorageResult<()>;

    // Group operations

    /// Creates or renames a group.
    async fn upsert_group(&self, group: StoredGroup) -> StorageResult<()>;

    /// Sets the group's permission on a project, replacing any existing row.
    async fn set_group_permission(
        &self,
        group_id: GroupId,
        project_id: ProjectId,
        access_type: AccessType,
    ) -> StorageResult<()>;

    /// Adds the user to a group.
    async fn add_group_member(&self, group_id: GroupId, user_id: &UserId) -> StorageResult<()>;

    /// Removes the user from a group, if a member.
    async fn remove_group_member(&self, group_id: GroupId, user_id: &UserId)
        -> StorageResult<()>;

    // Access queries

    /// Fetches a user with role and groups; group permissions exclude deleted projects.
    async fn get_user_profile(&self, user_id: &UserId) -> StorageResult<Option<UserProfile>>;

    /// Lists every non-deleted project.
    async fn list_non_deleted_projects(&self) -> StorageResult<Vec<ProjectId>>;

    /// Lists non-deleted projects created by the user.
    async fn list_projects_created_by(&self, user_id: &UserId) -> StorageResult<Vec<ProjectId>>;

    /// Lists projects with a user permission row passing `filter`.
    async fn list_user_permissions(
        &self,
        user_id: &UserId,
        filter: PermissionFilter,
    ) -> StorageResult<Vec<ProjectId>>;

    /// Lists non-deleted projects the user is assigned to.
    async fn list_project_assignments(&self, user_id: &UserId) -> StorageResult<Vec<ProjectId>>;

    /// Lists non-deleted projects whose default policy matches `query`.
    async fn list_projects_by_default_access(
        &self,
        query: DefaultAccessQuery,
    ) -> StorageResult<Vec<ProjectId>>;
}
