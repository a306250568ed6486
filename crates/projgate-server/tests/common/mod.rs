//! Shared test utilities for projgate service tests.

// Each test file compiles this module separately and uses a different subset.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use projgate_domain::model::{
    AccessType, DefaultAccess, DefaultAccessQuery, GroupId, PermissionFilter, Project, ProjectId,
    RoleId, UserId, UserProfile,
};
use projgate_storage::{
    DataStore, MemoryDataStore, StorageError, StorageResult, StoredGroup, StoredUser,
};

// =============================================================================
// Fixtures
// =============================================================================

/// Id of the user that creates fixture projects.
pub const CREATOR: &str = "creator";

/// Creates a store holding only the fixture creator.
pub async fn store_with_creator() -> Arc<MemoryDataStore> {
    let storage = MemoryDataStore::new_shared();
    storage.upsert_user(StoredUser::new(CREATOR)).await.unwrap();
    storage
}

/// Adds a live project created by [`CREATOR`].
pub async fn add_project(storage: &MemoryDataStore, id: i64, default_access: DefaultAccess) {
    storage
        .upsert_project(Project::new(
            ProjectId(id),
            UserId::new(CREATOR),
            default_access,
        ))
        .await
        .unwrap();
}

/// Adds a regular user, optionally holding a global role.
pub async fn add_user(storage: &MemoryDataStore, id: &str, role: Option<i64>) -> UserId {
    let mut user = StoredUser::new(id);
    if let Some(role) = role {
        user = user.with_role(RoleId(role));
    }
    storage.upsert_user(user).await.unwrap();
    UserId::new(id)
}

/// Creates a group with `user` as its only member.
pub async fn add_group_with_member(storage: &MemoryDataStore, group: i64, user: &UserId) {
    storage
        .upsert_group(StoredGroup::new(GroupId(group), format!("group-{}", group)))
        .await
        .unwrap();
    storage.add_group_member(GroupId(group), user).await.unwrap();
}

pub fn ids(projects: &[ProjectId]) -> Vec<i64> {
    projects.iter().map(|p| p.0).collect()
}

// =============================================================================
// Failing store
// =============================================================================

/// A `DataStore` that delegates to [`MemoryDataStore`] but can be switched
/// into failing every access query with a connection error, or into answering
/// the assignment query late with rows read before the delay.
pub struct FlakyDataStore {
    inner: Arc<MemoryDataStore>,
    failing: AtomicBool,
    assignment_delay_ms: AtomicU64,
}

impl FlakyDataStore {
    pub fn new(inner: Arc<MemoryDataStore>) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
            assignment_delay_ms: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &Arc<MemoryDataStore> {
        &self.inner
    }

    pub fn set_assignment_delay(&self, delay: Duration) {
        self.assignment_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::ConnectionError {
                message: "connection reset by peer".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DataStore for FlakyDataStore {
    async fn upsert_user(&self, user: StoredUser) -> StorageResult<()> {
        self.inner.upsert_user(user).await
    }

    async fn get_user(&self, user_id: &UserId) -> StorageResult<StoredUser> {
        self.inner.get_user(user_id).await
    }

    async fn delete_user(&self, user_id: &UserId) -> StorageResult<()> {
        self.inner.delete_user(user_id).await
    }

    async fn upsert_project(&self, project: Project) -> StorageResult<()> {
        self.inner.upsert_project(project).await
    }

    async fn get_project(&self, project_id: ProjectId) -> StorageResult<Project> {
        self.inner.get_project(project_id).await
    }

    async fn soft_delete_project(&self, project_id: ProjectId) -> StorageResult<()> {
        self.inner.soft_delete_project(project_id).await
    }

    async fn set_user_permission(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
        access_type: AccessType,
    ) -> StorageResult<()> {
        self.inner
            .set_user_permission(user_id, project_id, access_type)
            .await
    }

    async fn remove_user_permission(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
    ) -> StorageResult<()> {
        self.inner.remove_user_permission(user_id, project_id).await
    }

    async fn add_project_assignment(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
    ) -> StorageResult<()> {
        self.inner.add_project_assignment(user_id, project_id).await
    }

    async fn remove_project_assignment(
        &self,
        user_id: &UserId,
        project_id: ProjectId,
    ) -> StorageResult<()> {
        self.inner.remove_project_assignment(user_id, project_id).await
    }

    async fn upsert_group(&self, group: StoredGroup) -> StorageResult<()> {
        self.inner.upsert_group(group).await
    }

    async fn set_group_permission(
        &self,
        group_id: GroupId,
        project_id: ProjectId,
        access_type: AccessType,
    ) -> StorageResult<()> {
        self.inner
            .set_group_permission(group_id, project_id, access_type)
            .await
    }

    async fn add_group_member(&self, group_id: GroupId, user_id: &UserId) -> StorageResult<()> {
        self.inner.add_group_member(group_id, user_id).await
    }

    async fn remove_group_member(
        &self,
        group_id: GroupId,
        user_id: &UserId,
    ) -> StorageResult<()> {
        self.inner.remove_group_member(group_id, user_id).await
    }

    async fn get_user_profile(&self, user_id: &UserId) -> StorageResult<Option<UserProfile>> {
        self.check()?;
        self.inner.get_user_profile(user_id).await
    }

    async fn list_non_deleted_projects(&self) -> StorageResult<Vec<ProjectId>> {
        self.check()?;
        self.inner.list_non_deleted_projects().await
    }

    async fn list_projects_created_by(&self, user_id: &UserId) -> StorageResult<Vec<ProjectId>> {
        self.check()?;
        self.inner.list_projects_created_by(user_id).await
    }

    async fn list_user_permissions(
        &self,
        user_id: &UserId,
        filter: PermissionFilter,
    ) -> StorageResult<Vec<ProjectId>> {
        self.check()?;
        self.inner.list_user_permissions(user_id, filter).await
    }

    async fn list_project_assignments(&self, user_id: &UserId) -> StorageResult<Vec<ProjectId>> {
        self.check()?;
        let assigned = self.inner.list_project_assignments(user_id).await?;
        let delay = self.assignment_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(assigned)
    }

    async fn list_projects_by_default_access(
        &self,
        query: DefaultAccessQuery,
    ) -> StorageResult<Vec<ProjectId>> {
        self.check()?;
        self.inner.list_projects_by_default_access(query).await
    }
}

// =============================================================================
// Log capture
// =============================================================================

/// A writer that captures output to a shared buffer.
#[derive(Clone, Default)]
pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CaptureWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> String {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer).to_string()
    }
}

impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
