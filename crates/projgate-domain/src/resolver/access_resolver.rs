//! The project access resolver.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use indexmap::IndexSet;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::error::{DomainError, DomainResult};
use crate::model::{
    DefaultAccessQuery, PermissionFilter, ProjectId, SystemAccessLevel, UserId, UserProfile,
};

use super::config::ResolverConfig;
use super::traits::AccessReader;
use super::types::{AccessDecision, AccessSource, Outcome};

/// Project sets fetched for a regular user, before accumulation.
#[derive(Debug, Default)]
struct SourceSets {
    denied: HashSet<ProjectId>,
    owned: Vec<ProjectId>,
    granted: Vec<ProjectId>,
    assigned: Vec<ProjectId>,
    global_role: Vec<ProjectId>,
    specific_role: Vec<ProjectId>,
    legacy_default: Vec<ProjectId>,
}

/// Resolves the set of projects a user may access.
///
/// The public entry points never return errors: any failure is logged with
/// the user id and answered with an empty set. Use [`AccessResolver::try_resolve`]
/// to observe the underlying error.
pub struct AccessResolver<R> {
    reader: Arc<R>,
    config: ResolverConfig,
}

impl<R> AccessResolver<R>
where
    R: AccessReader + 'static,
{
    /// Creates a new resolver with the default configuration.
    pub fn new(reader: Arc<R>) -> Self {
        Self::with_config(reader, ResolverConfig::default())
    }

    /// Creates a new resolver with custom configuration.
    pub fn with_config(reader: Arc<R>, config: ResolverConfig) -> Self {
        Self { reader, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Returns the projects the user may access, in precedence order.
    ///
    /// Fail-closed: returns an empty set on any error.
    pub async fn resolve_accessible_projects(&self, user_id: &UserId) -> IndexSet<ProjectId> {
        self.explain(user_id).await.into_projects()
    }

    /// Returns true if `project_id` is among the user's accessible projects.
    pub async fn can_access_project(&self, user_id: &UserId, project_id: ProjectId) -> bool {
        self.explain(user_id).await.contains(project_id)
    }

    /// Resolves access and records which rule granted each project.
    ///
    /// Fail-closed: on error the decision is empty with [`Outcome::Failed`].
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn explain(&self, user_id: &UserId) -> AccessDecision {
        let decision = match self.try_resolve(user_id).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(
                    user_id = %user_id,
                    error = %e,
                    "Access resolution failed, denying access to all projects"
                );
                AccessDecision::new(user_id.clone(), Outcome::Failed)
            }
        };

        metrics::counter!(
            "projgate_access_resolutions_total",
            "outcome" => decision.outcome.as_str()
        )
        .increment(1);

        decision
    }

    /// Resolves access, returning any collaborator error to the caller.
    pub async fn try_resolve(&self, user_id: &UserId) -> DomainResult<AccessDecision> {
        if user_id.is_blank() {
            return Err(DomainError::InvalidUserId {
                value: user_id.to_string(),
            });
        }

        let Some(user) = self
            .query(
                "get_user_with_role_and_groups",
                self.reader.get_user_with_role_and_groups(user_id),
            )
            .await?
        else {
            debug!(user_id = %user_id, "User not found, no project access");
            return Ok(AccessDecision::new(user_id.clone(), Outcome::UserNotFound));
        };

        match user.system_access {
            SystemAccessLevel::None => {
                debug!(user_id = %user_id, "System access level NONE, no project access");
                return Ok(AccessDecision::new(user_id.clone(), Outcome::SystemNone));
            }
            SystemAccessLevel::Admin => {
                let projects = self
                    .query(
                        "list_non_deleted_projects",
                        self.reader.list_non_deleted_projects(),
                    )
                    .await?;
                let mut decision = AccessDecision::new(user_id.clone(), Outcome::SystemAdmin);
                for project_id in projects {
                    decision.grant(project_id, AccessSource::SystemAdmin);
                }
                debug!(user_id = %user_id, projects = decision.len(), "System admin access");
                return Ok(decision);
            }
            SystemAccessLevel::User => {}
        }

        let sources = if self.config.concurrent_queries {
            self.fetch_concurrent(&user).await?
        } else {
            self.fetch_sequential(&user).await?
        };

        let decision = accumulate(&user, sources);
        debug!(user_id = %user_id, projects = decision.len(), "Resolved project access");
        Ok(decision)
    }

    async fn fetch_concurrent(&self, user: &UserProfile) -> DomainResult<SourceSets> {
        let user_id = &user.id;
        let (denied, owned, granted, assigned, global_role, specific_role, legacy_default) =
            futures::try_join!(
                self.denials(user_id),
                self.query(
                    "list_projects_created_by",
                    self.reader.list_projects_created_by(user_id),
                ),
                self.query(
                    "list_user_permissions",
                    self.reader
                        .list_user_permissions(user_id, PermissionFilter::GRANTS),
                ),
                self.query(
                    "list_project_assignments",
                    self.reader.list_project_assignments(user_id),
                ),
                self.global_role_defaults(user),
                self.defaults(DefaultAccessQuery::SpecificRole),
                self.defaults(DefaultAccessQuery::Default),
            )?;

        Ok(SourceSets {
            denied,
            owned,
            granted,
            assigned,
            global_role,
            specific_role,
            legacy_default,
        })
    }

    async fn fetch_sequential(&self, user: &UserProfile) -> DomainResult<SourceSets> {
        let user_id = &user.id;
        let denied = self.denials(user_id).await?;
        let owned = self
            .query(
                "list_projects_created_by",
                self.reader.list_projects_created_by(user_id),
            )
            .await?;
        let granted = self
            .query(
                "list_user_permissions",
                self.reader
                    .list_user_permissions(user_id, PermissionFilter::GRANTS),
            )
            .await?;
        let assigned = self
            .query(
                "list_project_assignments",
                self.reader.list_project_assignments(user_id),
            )
            .await?;
        let global_role = self.global_role_defaults(user).await?;
        let specific_role = self.defaults(DefaultAccessQuery::SpecificRole).await?;
        let legacy_default = self.defaults(DefaultAccessQuery::Default).await?;

        Ok(SourceSets {
            denied,
            owned,
            granted,
            assigned,
            global_role,
            specific_role,
            legacy_default,
        })
    }

    async fn denials(&self, user_id: &UserId) -> DomainResult<HashSet<ProjectId>> {
        let denied = self
            .query(
                "list_user_denials",
                self.reader
                    .list_user_permissions(user_id, PermissionFilter::DENIALS),
            )
            .await?;
        Ok(denied.into_iter().collect())
    }

    async fn global_role_defaults(&self, user: &UserProfile) -> DomainResult<Vec<ProjectId>> {
        // Users without a global role get nothing from GLOBAL_ROLE projects
        if user.role_id.is_none() {
            return Ok(Vec::new());
        }
        self.defaults(DefaultAccessQuery::GlobalRole).await
    }

    async fn defaults(&self, query: DefaultAccessQuery) -> DomainResult<Vec<ProjectId>> {
        self.query(
            "list_projects_by_default_access",
            self.reader.list_projects_by_default_access(query),
        )
        .await
    }

    /// Runs a collaborator query under the configured timeout.
    async fn query<T, F>(&self, operation: &'static str, fut: F) -> DomainResult<T>
    where
        F: Future<Output = DomainResult<T>>,
    {
        match timeout(self.config.query_timeout, fut).await {
            Ok(result) => result,
            Err(_elapsed) => Err(DomainError::Timeout {
                operation: operation.to_string(),
                duration_ms: u64::try_from(self.config.query_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            }),
        }
    }
}

/// Combines the fetched sources in precedence order.
///
/// A denied project is skipped only for sources where
/// [`AccessSource::is_deniable`] holds.
fn accumulate(user: &UserProfile, sources: SourceSets) -> AccessDecision {
    let SourceSets {
        denied,
        owned,
        granted,
        assigned,
        global_role,
        specific_role,
        legacy_default,
    } = sources;

    let mut decision = AccessDecision::new(user.id.clone(), Outcome::Evaluated);
    let mut admit = |project_id: ProjectId, source: AccessSource| {
        if source.is_deniable() && denied.contains(&project_id) {
            return;
        }
        decision.grant(project_id, source);
    };

    let unconditional = [
        (owned, AccessSource::Ownership),
        (granted, AccessSource::ExplicitGrant),
        (assigned, AccessSource::Assignment),
    ];
    for (projects, source) in unconditional {
        for project_id in projects {
            admit(project_id, source);
        }
    }

    for group in &user.groups {
        let source = AccessSource::Group {
            group_id: group.group_id,
        };
        for permission in &group.permissions {
            if !permission.access_type.is_denial() {
                admit(permission.project_id, source);
            }
        }
    }

    let defaults = [
        (global_role, AccessSource::GlobalRoleDefault),
        (specific_role, AccessSource::SpecificRoleDefault),
        (legacy_default, AccessSource::LegacyDefault),
    ];
    for (projects, source) in defaults {
        for project_id in projects {
            admit(project_id, source);
        }
    }

    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AccessType, GroupGrants, GroupId, GroupProjectPermission};

    fn profile_with_group(project_ids: &[i64]) -> UserProfile {
        UserProfile::new("alice").with_group(GroupGrants {
            group_id: GroupId(9),
            permissions: project_ids
                .iter()
                .map(|id| GroupProjectPermission {
                    project_id: ProjectId(*id),
                    access_type: AccessType::Default,
                })
                .collect(),
        })
    }

    #[test]
    fn test_denial_applies_exactly_to_deniable_sources() {
        // Every source reaches its own project, and every project is denied
        let sources = SourceSets {
            denied: (1..=7).map(ProjectId).collect(),
            owned: vec![ProjectId(1)],
            granted: vec![ProjectId(2)],
            assigned: vec![ProjectId(3)],
            global_role: vec![ProjectId(5)],
            specific_role: vec![ProjectId(6)],
            legacy_default: vec![ProjectId(7)],
        };

        let decision = accumulate(&profile_with_group(&[4]), sources);

        let order: Vec<_> = decision.projects().into_iter().collect();
        assert_eq!(order, vec![ProjectId(1), ProjectId(2), ProjectId(3)]);
        assert!(decision.grants().values().all(|source| !source.is_deniable()));
    }

    #[test]
    fn test_undenied_projects_pass_every_source() {
        let sources = SourceSets {
            owned: vec![ProjectId(1)],
            global_role: vec![ProjectId(5)],
            legacy_default: vec![ProjectId(7)],
            ..Default::default()
        };

        let decision = accumulate(&profile_with_group(&[4]), sources);

        assert_eq!(decision.len(), 4);
        assert_eq!(
            decision.source_of(ProjectId(4)),
            Some(AccessSource::Group { group_id: GroupId(9) })
        );
    }
}
