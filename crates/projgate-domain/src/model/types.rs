//! Core type definitions for the access model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A user identifier as issued by the surrounding application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new user identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the identifier is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id!(
    /// A project identifier.
    ProjectId
);
numeric_id!(
    /// A group identifier.
    GroupId
);
numeric_id!(
    /// A global role identifier.
    RoleId
);

/// User-global access flag that can short-circuit every per-project rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemAccessLevel {
    /// The user may not see any project, including ones they created.
    None,
    /// Regular user; per-project rules apply.
    #[default]
    User,
    /// The user sees every non-deleted project.
    Admin,
}

impl SystemAccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemAccessLevel::None => "NONE",
            SystemAccessLevel::User => "USER",
            SystemAccessLevel::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for SystemAccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access type column shared by permission rows and stored project policies.
///
/// On a user or group permission row, `NoAccess` is an explicit denial and
/// every other value is a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessType {
    NoAccess,
    GlobalRole,
    SpecificRole,
    Default,
}

impl AccessType {
    /// Returns true if a row with this access type denies access.
    pub fn is_denial(&self) -> bool {
        matches!(self, AccessType::NoAccess)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::NoAccess => "NO_ACCESS",
            AccessType::GlobalRole => "GLOBAL_ROLE",
            AccessType::SpecificRole => "SPECIFIC_ROLE",
            AccessType::Default => "DEFAULT",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project's default access policy for users without an explicit or group grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DefaultAccess {
    /// Only explicit, group, ownership or assignment sources grant access.
    NoAccess,
    /// Users holding any global role get access.
    GlobalRole,
    /// Every user gets access under the role fixed by the project.
    SpecificRole { role_id: RoleId },
    /// Legacy policy: everyone has access unless explicitly denied.
    Default,
}

impl DefaultAccess {
    /// Returns the flat column value for this policy.
    pub fn access_type(&self) -> AccessType {
        match self {
            DefaultAccess::NoAccess => AccessType::NoAccess,
            DefaultAccess::GlobalRole => AccessType::GlobalRole,
            DefaultAccess::SpecificRole { .. } => AccessType::SpecificRole,
            DefaultAccess::Default => AccessType::Default,
        }
    }

    /// Returns the role fixed by the policy, if any.
    pub fn role_id(&self) -> Option<RoleId> {
        match self {
            DefaultAccess::SpecificRole { role_id } => Some(*role_id),
            _ => None,
        }
    }
}

/// A stored project row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub is_deleted: bool,
    pub created_by: UserId,
    pub default_access_type: AccessType,
    pub default_role_id: Option<RoleId>,
}

impl Project {
    /// Creates a live project with the given default policy.
    pub fn new(id: ProjectId, created_by: UserId, default_access: DefaultAccess) -> Self {
        Self {
            id,
            is_deleted: false,
            created_by,
            default_access_type: default_access.access_type(),
            default_role_id: default_access.role_id(),
        }
    }

    /// Returns the typed default policy.
    ///
    /// Returns `None` for a `SPECIFIC_ROLE` policy without a role id; such a
    /// project grants nothing through its default policy.
    pub fn default_access(&self) -> Option<DefaultAccess> {
        match self.default_access_type {
            AccessType::NoAccess => Some(DefaultAccess::NoAccess),
            AccessType::GlobalRole => Some(DefaultAccess::GlobalRole),
            AccessType::SpecificRole => self
                .default_role_id
                .map(|role_id| DefaultAccess::SpecificRole { role_id }),
            AccessType::Default => Some(DefaultAccess::Default),
        }
    }
}

/// A permission a group holds on a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupProjectPermission {
    pub project_id: ProjectId,
    pub access_type: AccessType,
}

/// A group the user belongs to, with the group's permissions on non-deleted projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupGrants {
    pub group_id: GroupId,
    pub permissions: Vec<GroupProjectPermission>,
}

/// A user with role and group memberships, as needed by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub system_access: SystemAccessLevel,
    pub role_id: Option<RoleId>,
    pub groups: Vec<GroupGrants>,
}

impl UserProfile {
    /// Creates a regular user without role or groups.
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            system_access: SystemAccessLevel::User,
            role_id: None,
            groups: Vec::new(),
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

    pub fn with_group(mut self, group: GroupGrants) -> Self {
        self.groups.push(group);
        self
    }
}

/// Filter applied to a user's explicit permission rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionFilter {
    /// Rows whose access type differs from the given one, on non-deleted projects.
    ExcludeAccessType(AccessType),
    /// Rows with exactly the given access type, regardless of project deletion.
    OnlyAccessType(AccessType),
}

impl PermissionFilter {
    /// Explicit grants: every non-denial row on a live project.
    pub const GRANTS: PermissionFilter = PermissionFilter::ExcludeAccessType(AccessType::NoAccess);
    /// Explicit denials: every `NO_ACCESS` row.
    pub const DENIALS: PermissionFilter = PermissionFilter::OnlyAccessType(AccessType::NoAccess);

    /// Returns true if a row with `access_type` passes this filter.
    pub fn matches(&self, access_type: AccessType) -> bool {
        match self {
            PermissionFilter::ExcludeAccessType(excluded) => access_type != *excluded,
            PermissionFilter::OnlyAccessType(only) => access_type == *only,
        }
    }

    /// Returns true if rows on deleted projects must be dropped.
    pub fn excludes_deleted(&self) -> bool {
        matches!(self, PermissionFilter::ExcludeAccessType(_))
    }
}

/// Default-policy query issued once per granting policy kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultAccessQuery {
    /// `GLOBAL_ROLE` projects.
    GlobalRole,
    /// `SPECIFIC_ROLE` projects with a non-null default role.
    SpecificRole,
    /// Legacy `DEFAULT` projects.
    Default,
}

impl DefaultAccessQuery {
    /// Returns true if a project with the given policy is selected by this query.
    pub fn matches(&self, policy: Option<DefaultAccess>) -> bool {
        matches!(
            (self, policy),
            (DefaultAccessQuery::GlobalRole, Some(DefaultAccess::GlobalRole))
                | (DefaultAccessQuery::SpecificRole, Some(DefaultAccess::SpecificRole { .. }))
                | (DefaultAccessQuery::Default, Some(DefaultAccess::Default))
        )
    }
}
