//! Tests for the access resolver module.
//!
//! Organized by functionality:
//! - System level short-circuits (missing user, NONE, ADMIN)
//! - Unconditional sources (ownership, explicit grants, assignments)
//! - Deniable sources (groups, project default policies)
//! - Ordering and de-duplication
//! - Fail-closed error handling (failures, timeouts, invalid input)
