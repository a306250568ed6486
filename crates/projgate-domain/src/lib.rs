//! projgate-domain: Core project access-resolution logic
//!
//! This crate contains the decision logic that answers "which projects may
//! this user see?":
//! - Access data model (users, projects, permission rows, default policies)
//! - `AccessReader` trait describing the read queries the resolver needs
//! - `AccessResolver` combining ownership, grants, denials, group grants and
//!   project default policies into one ordered, fail-closed answer
//! - `AccessCache` for callers that want to memoize resolved access sets
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               projgate-domain               │
//! ├─────────────────────────────────────────────┤
//! │  model/     - Ids, access enums, records    │
//! │  resolver/  - Access resolution engine      │
//! │  cache/     - Resolved access set caching   │
//! └─────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod error;
pub mod model;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use cache::{AccessCache, AccessCacheConfig};
pub use error::{DomainError, DomainResult};
pub use resolver::{AccessDecision, AccessReader, AccessResolver, AccessSource, ResolverConfig};
