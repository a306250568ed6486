//! Project access service.
//!
//! Entry point for the surrounding application: project listings and
//! authorization middleware call [`ProjectAccessService`], which resolves
//! access through the domain resolver and, when enabled, memoizes results in
//! an [`AccessCache`].
//!
//! Mutations of access data must be reported through
//! [`ProjectAccessService::on_user_changed`] or
//! [`ProjectAccessService::on_policy_changed`] to keep cached sets current.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};

use projgate_domain::cache::AccessCache;
use projgate_domain::model::{ProjectId, UserId};
use projgate_domain::resolver::{AccessDecision, AccessResolver, Outcome, ResolverConfig};
use projgate_storage::DataStore;

use crate::adapters::DataStoreAccessReader;
use crate::config::ServerConfig;

/// Timeout for cache reads. A slow cache is treated as a miss.
const CACHE_OP_TIMEOUT: Duration = Duration::from_millis(50);

/// Resolves project access for application callers.
pub struct ProjectAccessService<S: DataStore> {
    storage: Arc<S>,
    resolver: AccessResolver<DataStoreAccessReader<S>>,
    cache: Option<Arc<AccessCache>>,
}

impl<S: DataStore> ProjectAccessService<S> {
    /// Creates a service without caching.
    pub fn new(storage: Arc<S>, config: ResolverConfig) -> Self {
        let reader = Arc::new(DataStoreAccessReader::new(Arc::clone(&storage)));
        Self {
            storage,
            resolver: AccessResolver::with_config(reader, config),
            cache: None,
        }
    }

    /// Creates a service from loaded configuration.
    ///
    /// A cache is attached only when `cache.enabled` is set.
    pub fn from_config(storage: Arc<S>, config: &ServerConfig) -> Self {
        let service = Self::new(storage, config.resolver.to_resolver_config());
        if config.cache.enabled {
            service.with_cache(Arc::new(AccessCache::new(config.cache.to_cache_config())))
        } else {
            service
        }
    }

    /// Attaches a cache for resolved access sets.
    pub fn with_cache(mut self, cache: Arc<AccessCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn resolver(&self) -> &AccessResolver<DataStoreAccessReader<S>> {
        &self.resolver
    }

    pub fn cache(&self) -> Option<&Arc<AccessCache>> {
        self.cache.as_ref()
    }

    /// Returns the projects the user may access, in precedence order.
    ///
    /// Fail-closed: an error yields an empty list. Failed evaluations are not
    /// cached.
    pub async fn accessible_projects(&self, user_id: &UserId) -> Vec<ProjectId> {
        if let Some(cache) = &self.cache {
            match timeout(CACHE_OP_TIMEOUT, cache.get(user_id)).await {
                Ok(Some(projects)) => return projects.iter().copied().collect(),
                Ok(None) => {}
                Err(_) => {
                    warn!(user_id = %user_id, "Access cache read timed out, resolving directly");
                }
            }
        }

        // Taken before any row is read so a concurrent invalidation is detected
        let generation = self.cache.as_ref().map(|cache| cache.generation());

        let decision = self.resolver.explain(user_id).await;
        let outcome = decision.outcome;
        let projects = decision.into_projects();
        let result: Vec<ProjectId> = projects.iter().copied().collect();

        if let (Some(cache), Some(generation)) = (&self.cache, generation) {
            // Not bounded by CACHE_OP_TIMEOUT: cancelling between the write
            // and the generation re-check could leave a stale entry behind.
            if outcome != Outcome::Failed
                && !cache
                    .insert_if_current(user_id.clone(), Arc::new(projects), generation)
                    .await
            {
                debug!(user_id = %user_id, "Access data changed during resolution, result not cached");
            }
        }

        result
    }

    /// Resolves access with per-project provenance. Never cached.
    pub async fn explain(&self, user_id: &UserId) -> AccessDecision {
        self.resolver.explain(user_id).await
    }

    /// Returns true if the user may access `project_id`.
    pub async fn can_access_project(&self, user_id: &UserId, project_id: ProjectId) -> bool {
        self.accessible_projects(user_id).await.contains(&project_id)
    }

    /// Reports a change to one user's permissions, assignments, group
    /// memberships, role or system level.
    pub async fn on_user_changed(&self, user_id: &UserId) {
        if let Some(cache) = &self.cache {
            debug!(user_id = %user_id, "Invalidating cached project access for user");
            cache.invalidate_user(user_id).await;
        }
    }

    /// Reports a project creation, deletion or default-policy change, or a
    /// group permission change. Every cached set is dropped.
    pub fn on_policy_changed(&self) {
        if let Some(cache) = &self.cache {
            debug!("Invalidating all cached project access");
            cache.invalidate_all();
        }
    }
}
