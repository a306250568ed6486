//! In-memory storage implementation for testing and embedded use.
//!
//! Per-user and per-group rows are kept in ordered maps so every listing is
//! returned in ascending project id order without a separate sort.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use projgate_domain::model::{
    AccessType, DefaultAccessQuery, GroupGrants, GroupId, GroupProjectPermission,
    PermissionFilter, Project, ProjectId, UserId, UserProfile,
};

use crate::error::{StorageError, StorageResult};
use crate::traits::{validate_group_name, validate_user_id, DataStore, StoredGroup, StoredUser};

/// In-memory implementation of DataStore.
///
/// Uses DashMap for thread-safe concurrent access. No operation holds a
/// reference into a map while writing to the same map.
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    users: DashMap<UserId, StoredUser>,
    projects: DashMap<ProjectId, Project>,
    user_permissions: DashMap<UserId, BTreeMap<ProjectId, AccessType>>,
    assignments: DashMap<UserId, BTreeSet<ProjectId>>,
    groups: DashMap<GroupId, StoredGroup>,
    group_permissions: DashMap<GroupId, BTreeMap<ProjectId, AccessType>>,
    memberships: DashMap<UserId, BTreeSet<GroupId>>,
}

impl MemoryDataStore {
    /// Creates a new in-memory data store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new in-memory data store wrapped in Arc.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn is_live(&self, project_id: ProjectId) -> bool {
        self.projects
            .get(&project_id)
            .is_some_and(|p| !p.is_deleted)
    }

    fn require_user(&self, user_id: &UserId) -> StorageResult<()> {
        validate_user_id(user_id)?;
        if !self.users.contains_key(user_id) {
            return Err(StorageError::UserNotFound {
                user_id: user_id.to_string(),
            });
        }
        Ok(())
    }

    fn require_project(&self, project_id: ProjectId) -> StorageResult<()> {
        if !self.projects.contains_key(&project_id) {
            return Err(StorageError::ProjectNotFound { project_id });
        }
        Ok(())
    }

    fn require_group(&self, group_id: GroupId) -> StorageResult<()> {
        if !self.groups.contains_key(&group_id) {
            return Err(StorageError::GroupNotFound { group_id });
        }
        Ok(())
    }

    /// Returns live project ids matching `predicate`, ascending.
    fn live_projects_where<F>(&self, predicate: F) -> Vec<ProjectId>
    where
        F: Fn(&Project) -> bool,
    {
        let mut ids: Vec<ProjectId> = self
            .projects
            .iter()
            .filter(|entry| !entry.is_deleted && predicate(entry.value()))
            .map(|entry| *entry.key())
            .collect();
        ids.sort_unstable();
        ids
    }
}

#[async_trait]
impl DataStore for MemoryDataStore {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn upsert_user(&self, user: StoredUser) -> StorageResult<()> {
        validate_user_id(&user.id)?;
        self.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, user_id: &UserId) -> StorageResult<StoredUser> {
        self.users
            .get(user_id)
            .map(|u| u.value().clone())
            .ok_or_else(|| StorageError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn delete_user(&self, user_id: &UserId) -> StorageResult<()> {
        if self.users.remove(user_id).is_none() {
            return Err(StorageError::UserNotFound {
                user_id: user_id.to_string(),
            });
        }
        self.user_permissions.remove(user_id);
        self.assignments.remove(user_id);
        self.memberships.remove(user_id);
        debug!("Deleted user and their access rows");
        Ok(())
    }

    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn upsert_project(&self, project: Project) -> StorageResult<()> {
        self.require_user(&project.created_by)?;
        self.projects.insert(project.id, project);
        Ok(())
    }

    async fn get_project(&self, project_id: ProjectId) -> StorageResult<Project> {
        self.projects
            .get(&project_id)
            .map(|p| p.value().clone())
            .ok_or(StorageError::ProjectNotFound { project_id })
    }

    #[instrument(skip(self))]
    async fn soft_delete_project(&self, project_id: ProjectId) -> StorageResult<()> {
        let mut project = self
            .projects
            .get_mut(&project_id)
            .ok_or(StorageError::ProjectNotFound { project_id })?;
        project.is_deleted = true;
        Ok(())
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn set_user_permission(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
        access_type: AccessType,
    ) -> StorageResult<()> {
        self.require_user(user_id)?;
        self.require_project(project_id)?;
        // One row per (user, project): a new access type replaces the old one
        self.user_permissions
            .entry(user_id.clone())
            .or_default()
            .insert(project_id, access_type);
        Ok(())
    }

    async fn remove_user_permission(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
    ) -> StorageResult<()> {
        if let Some(mut rows) = self.user_permissions.get_mut(user_id) {
            rows.remove(&project_id);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn add_project_assignment(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
    ) -> StorageResult<()> {
        self.require_user(user_id)?;
        self.require_project(project_id)?;
        self.assignments
            .entry(user_id.clone())
            .or_default()
            .insert(project_id);
        Ok(())
    }

    async fn remove_project_assignment(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
    ) -> StorageResult<()> {
        if let Some(mut assigned) = self.assignments.get_mut(user_id) {
            assigned.remove(&project_id);
        }
        Ok(())
    }

    #[instrument(skip(self, group), fields(group_id = %group.id))]
    async fn upsert_group(&self, group: StoredGroup) -> StorageResult<()> {
        validate_group_name(&group.name)?;
        self.groups.insert(group.id, group);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_group_permission(
        &self,
        group_id: GroupId,
        project_id: ProjectId,
        access_type: AccessType,
    ) -> StorageResult<()> {
        self.require_group(group_id)?;
        self.require_project(project_id)?;
        self.group_permissions
            .entry(group_id)
            .or_default()
            .insert(project_id, access_type);
        Ok(())
    }

    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn add_group_member(&self, group_id: GroupId, user_id: &UserId) -> StorageResult<()> {
        self.require_user(user_id)?;
        self.require_group(group_id)?;
        self.memberships
            .entry(user_id.clone())
            .or_default()
            .insert(group_id);
        Ok(())
    }

    async fn remove_group_member(
        &self,
        group_id: GroupId,
        user_id: &UserId,
    ) -> StorageResult<()> {
        if let Some(mut groups) = self.memberships.get_mut(user_id) {
            groups.remove(&group_id);
        }
        Ok(())
    }

    async fn get_user_profile(&self, user_id: &UserId) -> StorageResult<Option<UserProfile>> {
        let Some(user) = self.users.get(user_id).map(|u| u.value().clone()) else {
            return Ok(None);
        };

        let group_ids: Vec<GroupId> = self
            .memberships
            .get(user_id)
            .map(|groups| groups.iter().copied().collect())
            .unwrap_or_default();

        let groups = group_ids
            .into_iter()
            .map(|group_id| {
                let permissions = self
                    .group_permissions
                    .get(&group_id)
                    .map(|rows| {
                        rows.iter()
                            .filter(|(project_id, _)| self.is_live(**project_id))
                            .map(|(project_id, access_type)| GroupProjectPermission {
                                project_id: *project_id,
                                access_type: *access_type,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                GroupGrants {
                    group_id,
                    permissions,
                }
            })
            .collect();

        Ok(Some(UserProfile {
            id: user.id,
            system_access: user.system_access,
            role_id: user.role_id,
            groups,
        }))
    }

    async fn list_non_deleted_projects(&self) -> StorageResult<Vec<ProjectId>> {
        Ok(self.live_projects_where(|_| true))
    }

    async fn list_projects_created_by(&self, user_id: &UserId) -> StorageResult<Vec<ProjectId>> {
        Ok(self.live_projects_where(|p| &p.created_by == user_id))
    }

    async fn list_user_permissions(
        &self,
        user_id: &UserId,
        filter: PermissionFilter,
    ) -> StorageResult<Vec<ProjectId>> {
        let rows: Vec<(ProjectId, AccessType)> = self
            .user_permissions
            .get(user_id)
            .map(|rows| rows.iter().map(|(p, a)| (*p, *a)).collect())
            .unwrap_or_default();

        Ok(rows
            .into_iter()
            .filter(|(_, access_type)| filter.matches(*access_type))
            .filter(|(project_id, _)| !filter.excludes_deleted() || self.is_live(*project_id))
            .map(|(project_id, _)| project_id)
            .collect())
    }

    async fn list_project_assignments(&self, user_id: &UserId) -> StorageResult<Vec<ProjectId>> {
        let assigned: Vec<ProjectId> = self
            .assignments
            .get(user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        Ok(assigned
            .into_iter()
            .filter(|project_id| self.is_live(*project_id))
            .collect())
    }

    async fn list_projects_by_default_access(
        &self,
        query: DefaultAccessQuery,
    ) -> StorageResult<Vec<ProjectId>> {
        Ok(self.live_projects_where(|p| query.matches(p.default_access())))
    }
}
