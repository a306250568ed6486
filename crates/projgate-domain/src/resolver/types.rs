//! Result types for access resolution.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::model::{GroupId, ProjectId, UserId};

/// The rule that first granted a project during an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AccessSource {
    /// System ADMIN sees every live project.
    SystemAdmin,
    /// The user created the project.
    Ownership,
    /// A non-denial explicit permission row.
    ExplicitGrant,
    /// A direct project assignment.
    Assignment,
    /// A permission held by one of the user's groups.
    Group { group_id: GroupId },
    /// Project default policy `GLOBAL_ROLE` and the user holds a global role.
    GlobalRoleDefault,
    /// Project default policy `SPECIFIC_ROLE`.
    SpecificRoleDefault,
    /// Legacy project default policy `DEFAULT`.
    LegacyDefault,
}

impl AccessSource {
    /// Returns true if an explicit denial can suppress this source.
    pub fn is_deniable(&self) -> bool {
        matches!(
            self,
            AccessSource::Group { .. }
                | AccessSource::GlobalRoleDefault
                | AccessSource::SpecificRoleDefault
                | AccessSource::LegacyDefault
        )
    }
}

impl fmt::Display for AccessSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessSource::SystemAdmin => f.write_str("system admin"),
            AccessSource::Ownership => f.write_str("ownership"),
            AccessSource::ExplicitGrant => f.write_str("explicit grant"),
            AccessSource::Assignment => f.write_str("assignment"),
            AccessSource::Group { group_id } => write!(f, "group {}", group_id),
            AccessSource::GlobalRoleDefault => f.write_str("global role default"),
            AccessSource::SpecificRoleDefault => f.write_str("specific role default"),
            AccessSource::LegacyDefault => f.write_str("legacy default"),
        }
    }
}

/// How an evaluation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No such user; no access.
    UserNotFound,
    /// System level NONE; no access.
    SystemNone,
    /// System level ADMIN; every live project.
    SystemAdmin,
    /// Per-project rules were evaluated.
    Evaluated,
    /// Evaluation failed and was closed to no access.
    Failed,
}

impl Outcome {
    /// Returns the label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::UserNotFound => "user_not_found",
            Outcome::SystemNone => "system_none",
            Outcome::SystemAdmin => "system_admin",
            Outcome::Evaluated => "evaluated",
            Outcome::Failed => "failed",
        }
    }
}

/// An auditable access answer: the ordered project set plus the source of each grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub user_id: UserId,
    pub outcome: Outcome,
    grants: IndexMap<ProjectId, AccessSource>,
}

impl AccessDecision {
    /// Creates a decision with no grants yet.
    pub fn new(user_id: UserId, outcome: Outcome) -> Self {
        Self {
            user_id,
            outcome,
            grants: IndexMap::new(),
        }
    }

    /// Records a grant unless the project is already present.
    ///
    /// Returns true if the project was newly added.
    pub(crate) fn grant(&mut self, project_id: ProjectId, source: AccessSource) -> bool {
        if self.grants.contains_key(&project_id) {
            return false;
        }
        self.grants.insert(project_id, source);
        true
    }

    /// Returns the accessible projects in first-seen order.
    pub fn projects(&self) -> IndexSet<ProjectId> {
        self.grants.keys().copied().collect()
    }

    /// Consumes the decision, returning the accessible projects.
    pub fn into_projects(self) -> IndexSet<ProjectId> {
        self.grants.into_keys().collect()
    }

    /// Returns the accessible projects with the source that first granted each.
    pub fn grants(&self) -> &IndexMap<ProjectId, AccessSource> {
        &self.grants
    }

    /// Returns the source that granted `project_id`, if accessible.
    pub fn source_of(&self, project_id: ProjectId) -> Option<AccessSource> {
        self.grants.get(&project_id).copied()
    }

    pub fn contains(&self, project_id: ProjectId) -> bool {
        self.grants.contains_key(&project_id)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}
