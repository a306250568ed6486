//! Resolved access set caching with TTL and explicit invalidation.
//!
//! The resolver itself never caches. Callers that resolve the same user
//! repeatedly (project listings, per-request middleware) can keep resolved
//! sets here, provided every mutation of access data triggers the matching
//! invalidation.
//!
//! # Cache Safety
//!
//! By default, caching is **disabled** (`enabled: false`). A cached access set
//! keeps granting projects after a denial, removal or deletion until it is
//! invalidated or its TTL expires.
//!
//! Invalidation rules:
//! - A change to one user's permissions, assignments, group memberships, role
//!   or system level: [`AccessCache::invalidate_user`].
//! - A project creation, deletion or default-policy change, or a group
//!   permission change: [`AccessCache::invalidate_all`], since any user may be
//!   affected.
//!
//! A resolution can still be running when an invalidation arrives, holding
//! rows read before the change. Every invalidation therefore bumps a
//! generation counter, and [`AccessCache::insert_if_current`] refuses a set
//! whose resolution started under an older generation.
//!
//! # Example
//!
//! ```rust,ignore
//! use projgate_domain::cache::{AccessCache, AccessCacheConfig};
//!
//! let cache = AccessCache::new(AccessCacheConfig::default().with_enabled(true));
//! cache.insert(user_id.clone(), Arc::new(projects)).await;
//! assert!(cache.get(&user_id).await.is_some());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexSet;
use moka::future::Cache;

use crate::model::{ProjectId, UserId};

/// Shared, immutable access set as stored in the cache.
pub type CachedProjects = Arc<IndexSet<ProjectId>>;

/// Configuration for the access cache.
#[derive(Debug, Clone)]
pub struct AccessCacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// Maximum number of cached users.
    pub max_capacity: u64,
    /// Time after which an entry expires regardless of invalidation.
    pub ttl: Duration,
}

impl Default for AccessCacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_capacity: 10_000,
            ttl: Duration::from_secs(30),
        }
    }
}

impl AccessCacheConfig {
    /// Enables or disables caching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the maximum capacity.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    /// Sets the TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Per-user cache of resolved access sets.
///
/// Uses Moka's async Cache for lock-free concurrent access with automatic
/// TTL-based eviction. Fully thread-safe.
pub struct AccessCache {
    cache: Cache<UserId, CachedProjects>,
    config: AccessCacheConfig,
    generation: AtomicU64,
}

impl std::fmt::Debug for AccessCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessCache")
            .field("config", &self.config)
            .field("entry_count", &self.cache.entry_count())
            .field("generation", &self.generation())
            .finish()
    }
}

impl AccessCache {
    /// Creates a new access cache with the given configuration.
    pub fn new(config: AccessCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.ttl)
            .build();

        Self {
            cache,
            config,
            generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &AccessCacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Stores a successfully resolved access set. No-op when disabled.
    pub async fn insert(&self, user_id: UserId, projects: CachedProjects) {
        if !self.config.enabled {
            return;
        }
        self.cache.insert(user_id, projects).await;
    }

    /// Returns the invalidation generation. Read it before resolving and pass
    /// it to [`AccessCache::insert_if_current`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Stores a resolved set unless an invalidation happened since
    /// `generation` was read.
    ///
    /// Returns true if the set was kept. The generation is checked again after
    /// the write, so an invalidation racing with the write also drops it.
    pub async fn insert_if_current(
        &self,
        user_id: UserId,
        projects: CachedProjects,
        generation: u64,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }
        if self.generation() != generation {
            metrics::counter!("projgate_access_cache_stale_writes_total").increment(1);
            return false;
        }
        self.cache.insert(user_id.clone(), projects).await;
        if self.generation() != generation {
            self.cache.invalidate(&user_id).await;
            metrics::counter!("projgate_access_cache_stale_writes_total").increment(1);
            return false;
        }
        true
    }

    /// Retrieves a cached access set.
    ///
    /// Records `projgate_access_cache_hits_total` / `projgate_access_cache_misses_total`.
    pub async fn get(&self, user_id: &UserId) -> Option<CachedProjects> {
        if !self.config.enabled {
            return None;
        }
        let result = self.cache.get(user_id).await;
        if result.is_some() {
            metrics::counter!("projgate_access_cache_hits_total").increment(1);
        } else {
            metrics::counter!("projgate_access_cache_misses_total").increment(1);
        }
        result
    }

    /// Drops the cached access set of one user.
    pub async fn invalidate_user(&self, user_id: &UserId) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate(user_id).await;
    }

    /// Drops every cached access set.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
    }

    /// Returns the approximate number of entries in the cache.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending maintenance tasks (for accurate counts in tests).
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}
