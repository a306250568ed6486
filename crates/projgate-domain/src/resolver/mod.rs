//! Project access resolution.
//!
//! The resolver reads a user's authorization sources through an
//! [`AccessReader`] and combines them into an ordered, de-duplicated set of
//! accessible projects.
//!
//! # Architecture Decisions
//!
//! - **Fail-closed**: every error (collaborator failure, timeout, invalid
//!   input) resolves to an empty access set. Errors are logged, never returned
//!   from the public entry points.
//!
//! - **Precedence**: system level first (NONE denies everything, ADMIN sees
//!   every live project), then ownership, explicit grants and assignments,
//!   which no denial can suppress, then group grants and project default
//!   policies, which explicit denials do suppress.
//!
//! - **Ordering**: results use `IndexSet` so the first source that reaches a
//!   project fixes its position.
//!
//! - **Query fan-out**: all post-lookup queries are independent and are issued
//!   concurrently with `futures::try_join!` unless disabled in the config.

mod access_resolver;
mod config;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use access_resolver::AccessResolver;
pub use config::ResolverConfig;
pub use traits::AccessReader;
pub use types::{AccessDecision, AccessSource, Outcome};
