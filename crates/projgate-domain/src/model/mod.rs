//! Access data model.
//!
//! Records owned by the surrounding application, in the shape the resolver
//! reads them.

mod types;
mod types_proptest;

pub use types::{
    AccessType, DefaultAccess, DefaultAccessQuery, GroupGrants, GroupId, GroupProjectPermission,
    PermissionFilter, Project, ProjectId, RoleId, SystemAccessLevel, UserId, UserProfile,
};
