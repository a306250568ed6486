//! Configuration for the access resolver.

use std::time::Duration;

/// Configuration for the access resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound for each individual collaborator query.
    pub query_timeout: Duration,
    /// Issue the independent source queries concurrently.
    ///
    /// Results are identical either way; insertion order is fixed by rule
    /// order, not by query completion order.
    pub concurrent_queries: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(5),
            concurrent_queries: true,
        }
    }
}

impl ResolverConfig {
    /// Creates a new configuration with the specified per-query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Creates a new configuration with concurrent queries enabled or disabled.
    pub fn with_concurrent_queries(mut self, concurrent: bool) -> Self {
        self.concurrent_queries = concurrent;
        self
    }
}
