//! Cache invalidation racing with in-flight resolutions.
//!
//! A resolution that read access rows before a mutation must not write its
//! now-stale answer into the cache once the mutation has been reported.

mod common;

use std::sync::Arc;
use std::time::Duration;

use projgate_domain::cache::{AccessCache, AccessCacheConfig};
use projgate_domain::model::{DefaultAccess, ProjectId, UserId};
use projgate_domain::resolver::ResolverConfig;
use projgate_server::ProjectAccessService;
use projgate_storage::DataStore;

use common::{add_project, add_user, ids, store_with_creator, FlakyDataStore};

/// How long the assignment query holds its already-read rows.
const SLOW_QUERY: Duration = Duration::from_millis(200);

/// When the concurrent mutation lands, well inside `SLOW_QUERY`.
const MUTATION_AFTER: Duration = Duration::from_millis(50);

async fn assigned_alice() -> (Arc<FlakyDataStore>, ProjectAccessService<FlakyDataStore>) {
    let inner = store_with_creator().await;
    add_project(&inner, 1, DefaultAccess::NoAccess).await;
    let alice = add_user(&inner, "alice", None).await;
    inner
        .add_project_assignment(&alice, ProjectId(1))
        .await
        .unwrap();

    let storage = Arc::new(FlakyDataStore::new(inner));
    let service = ProjectAccessService::new(Arc::clone(&storage), ResolverConfig::default())
        .with_cache(Arc::new(AccessCache::new(
            AccessCacheConfig::default().with_enabled(true),
        )));
    (storage, service)
}

#[tokio::test]
async fn test_user_invalidation_during_resolution_discards_stale_result() {
    let (storage, service) = assigned_alice().await;
    let alice = UserId::new("alice");
    storage.set_assignment_delay(SLOW_QUERY);

    let (in_flight, ()) = tokio::join!(service.accessible_projects(&alice), async {
        tokio::time::sleep(MUTATION_AFTER).await;
        storage
            .remove_project_assignment(&alice, ProjectId(1))
            .await
            .unwrap();
        service.on_user_changed(&alice).await;
    });

    // The in-flight caller saw the rows it read; nobody after it may.
    assert_eq!(ids(&in_flight), vec![1]);
    let cache = service.cache().unwrap();
    assert!(cache.get(&alice).await.is_none());

    storage.set_assignment_delay(Duration::ZERO);
    assert!(service.accessible_projects(&alice).await.is_empty());
}

#[tokio::test]
async fn test_policy_invalidation_during_resolution_discards_stale_result() {
    let (storage, service) = assigned_alice().await;
    let alice = UserId::new("alice");
    storage.set_assignment_delay(SLOW_QUERY);

    let (in_flight, ()) = tokio::join!(service.accessible_projects(&alice), async {
        tokio::time::sleep(MUTATION_AFTER).await;
        storage.soft_delete_project(ProjectId(1)).await.unwrap();
        service.on_policy_changed();
    });

    assert_eq!(ids(&in_flight), vec![1]);

    storage.set_assignment_delay(Duration::ZERO);
    assert!(service.accessible_projects(&alice).await.is_empty());
}

#[tokio::test]
async fn test_slow_resolution_without_mutation_is_cached() {
    let (storage, service) = assigned_alice().await;
    let alice = UserId::new("alice");
    storage.set_assignment_delay(SLOW_QUERY);

    assert_eq!(ids(&service.accessible_projects(&alice).await), vec![1]);

    let cached = service.cache().unwrap().get(&alice).await.unwrap();
    assert_eq!(cached.iter().map(|p| p.0).collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn test_reported_change_after_caching_is_visible() {
    let (storage, service) = assigned_alice().await;
    let alice = UserId::new("alice");

    assert_eq!(ids(&service.accessible_projects(&alice).await), vec![1]);

    storage
        .remove_project_assignment(&alice, ProjectId(1))
        .await
        .unwrap();
    assert_eq!(ids(&service.accessible_projects(&alice).await), vec![1]);

    service.on_user_changed(&alice).await;
    assert!(service.accessible_projects(&alice).await.is_empty());
}
