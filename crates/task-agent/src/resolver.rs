//! Positional task-reference resolution.
//!
//! Users refer to tasks by the 1-based position shown in the last list
//! ("task 2"); tools need the durable task id. This module keeps a per-owner
//! snapshot of the position-to-id mapping with a bounded freshness window,
//! and rebuilds the whole snapshot from a fresh full-list fetch whenever it
//! is missing, stale, or cannot answer the requested position. A snapshot is
//! always replaced wholesale; entries from two different list states are
//! never mixed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::store::{TaskStore, TaskView};
use task_store::StoreError;

/// How long a captured snapshot may be trusted without re-fetching.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(300);

/// Maximum number of owners to track before LRU eviction.
const DEFAULT_MAX_OWNERS: usize = 10_000;

/// One position entry: the task occupying that position when captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRef {
    /// Durable task id.
    pub task_id: String,
    /// Display title at capture time.
    pub title: String,
}

/// A full position-to-id mapping captured from one list fetch.
#[derive(Debug, Clone)]
pub struct Snapshot {
    entries: Vec<CachedRef>,
    captured_at: Instant,
}

impl Snapshot {
    /// Capture a snapshot from a task list in store order.
    pub fn capture(tasks: &[TaskView]) -> Self {
        Self {
            entries: tasks
                .iter()
                .map(|t| CachedRef {
                    task_id: t.id.clone(),
                    title: t.title.clone(),
                })
                .collect(),
            captured_at: Instant::now(),
        }
    }

    /// Whether the snapshot is still usable at the given time.
    pub fn is_fresh_at(&self, now: Instant) -> bool {
        now.duration_since(self.captured_at) < FRESHNESS_WINDOW
    }

    /// Look up a 1-based position.
    pub fn lookup(&self, position: usize) -> Option<&CachedRef> {
        position.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// Number of positions in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&mut self, age: Duration) {
        self.captured_at -= age;
    }
}

/// Owner-keyed store of position snapshots with LRU eviction.
///
/// Snapshots are strictly partitioned by owner. Each owner's slot carries
/// its own mutex so a resolve-or-refresh sequence holds exclusive access for
/// that owner without blocking other owners.
#[derive(Debug)]
pub struct PositionCache {
    owners: RwLock<IndexMap<String, Arc<Mutex<Option<Snapshot>>>>>,
    max_owners: usize,
}

impl Default for PositionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_OWNERS)
    }
}

impl PositionCache {
    /// Create a cache with the default owner limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with a custom owner limit.
    pub fn with_capacity(max_owners: usize) -> Self {
        Self {
            owners: RwLock::new(IndexMap::new()),
            max_owners,
        }
    }

    /// Get or create the slot for an owner, marking it recently used.
    pub(crate) async fn slot(&self, owner: &str) -> Arc<Mutex<Option<Snapshot>>> {
        let mut owners = self.owners.write().await;

        // Move to end to mark as recently used (LRU behavior)
        if let Some(slot) = owners.shift_remove(owner) {
            owners.insert(owner.to_string(), slot.clone());
            return slot;
        }

        let slot = Arc::new(Mutex::new(None));
        owners.insert(owner.to_string(), slot.clone());

        while owners.len() > self.max_owners {
            owners.shift_remove_index(0);
        }

        slot
    }

    /// Look up a position in the owner's snapshot, if one exists and is fresh.
    ///
    /// A read never creates a slot; only the resolve and rebuild paths do,
    /// so a miss cannot evict another owner's snapshot.
    pub async fn get(&self, owner: &str, position: usize) -> Option<CachedRef> {
        let slot = {
            let owners = self.owners.read().await;
            owners.get(owner).cloned()?
        };
        let guard = slot.lock().await;
        let snapshot = guard.as_ref()?;
        if !snapshot.is_fresh_at(Instant::now()) {
            return None;
        }
        snapshot.lookup(position).cloned()
    }

    /// Replace the owner's snapshot with one captured from a fresh list.
    pub async fn rebuild(&self, owner: &str, tasks: &[TaskView]) {
        let slot = self.slot(owner).await;
        let mut guard = slot.lock().await;
        *guard = Some(Snapshot::capture(tasks));
    }

    /// Drop the owner's snapshot.
    pub async fn invalidate(&self, owner: &str) {
        let mut owners = self.owners.write().await;
        owners.shift_remove(owner);
    }

    /// Number of owners currently tracked.
    pub async fn owner_count(&self) -> usize {
        self.owners.read().await.len()
    }
}

/// Outcome of resolving one task reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The reference was not positional; pass it through unchanged.
    Verbatim,
    /// The position mapped to a task.
    Resolved { task_id: String, title: String },
    /// The position is outside the current list.
    OutOfRange { position: usize, available: usize },
    /// The store could not be reached, even after a retry.
    StoreUnavailable,
}

/// Resolves positional task references against the position cache.
#[derive(Debug, Default)]
pub struct Resolver {
    cache: PositionCache,
}

impl Resolver {
    /// Create a resolver with a fresh cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver over an existing cache.
    pub fn with_cache(cache: PositionCache) -> Self {
        Self { cache }
    }

    /// Access the underlying cache.
    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }

    /// Whether a reference looks like a user-facing position.
    ///
    /// Durable ids are UUID strings and never all-digits; a short all-digit
    /// string is a position.
    pub fn is_position(reference: &str) -> bool {
        !reference.is_empty()
            && reference.len() <= 6
            && reference.bytes().all(|b| b.is_ascii_digit())
    }

    /// Resolve a task reference for an owner.
    ///
    /// Non-positional references pass through untouched. Positional
    /// references are answered from a fresh snapshot when possible;
    /// otherwise the owner's full list is fetched (retried exactly once),
    /// the snapshot is rebuilt wholesale, and the position is answered from
    /// the rebuilt snapshot. The owner's slot mutex is held across the whole
    /// sequence so concurrent resolves cannot interleave rebuilds.
    pub async fn resolve(
        &self,
        store: &dyn TaskStore,
        owner: &str,
        reference: &str,
    ) -> Resolution {
        if !Self::is_position(reference) {
            return Resolution::Verbatim;
        }
        // Bounded by is_position, cannot overflow
        let position: usize = reference.parse().unwrap_or(0);

        let slot = self.cache.slot(owner).await;
        let mut guard = slot.lock().await;

        if let Some(snapshot) = guard.as_ref() {
            if snapshot.is_fresh_at(Instant::now()) {
                if let Some(entry) = snapshot.lookup(position) {
                    debug!("Resolved position {} from cache for owner {}", position, owner);
                    return Resolution::Resolved {
                        task_id: entry.task_id.clone(),
                        title: entry.title.clone(),
                    };
                }
            }
        }

        let tasks = match self.fetch_with_retry(store, owner).await {
            Ok(tasks) => tasks,
            Err(()) => return Resolution::StoreUnavailable,
        };

        let snapshot = Snapshot::capture(&tasks);
        let resolution = match snapshot.lookup(position) {
            Some(entry) => Resolution::Resolved {
                task_id: entry.task_id.clone(),
                title: entry.title.clone(),
            },
            None => Resolution::OutOfRange {
                position,
                available: tasks.len(),
            },
        };
        *guard = Some(snapshot);

        resolution
    }

    /// Fetch the owner's full list and rebuild the snapshot.
    ///
    /// Used after every successful mutation and for full-list reads, so the
    /// next positional reference resolves against current state.
    pub async fn refresh(
        &self,
        store: &dyn TaskStore,
        owner: &str,
    ) -> Result<Vec<TaskView>, StoreError> {
        let slot = self.cache.slot(owner).await;
        let mut guard = slot.lock().await;

        match self.fetch_with_retry(store, owner).await {
            Ok(tasks) => {
                *guard = Some(Snapshot::capture(&tasks));
                Ok(tasks)
            }
            Err(()) => Err(StoreError::Unavailable("task list fetch failed".to_string())),
        }
    }

    async fn fetch_with_retry(
        &self,
        store: &dyn TaskStore,
        owner: &str,
    ) -> Result<Vec<TaskView>, ()> {
        match store.fetch_all(owner).await {
            Ok(tasks) => Ok(tasks),
            Err(first) => {
                warn!("Task list fetch failed for owner {}, retrying: {}", owner, first);
                match store.fetch_all(owner).await {
                    Ok(tasks) => Ok(tasks),
                    Err(second) => {
                        warn!("Task list fetch retry failed for owner {}: {}", owner, second);
                        Err(())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use task_store::{NewTask, TaskFilter, TaskPatch};

    fn view(id: &str, title: &str) -> TaskView {
        TaskView {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            completed: false,
            priority: "medium".to_string(),
            tags: None,
            due_date: None,
            created_at: "2026-01-01 00:00:00".to_string(),
        }
    }

    /// In-memory store stub: serves a fixed list, optionally failing the
    /// first N fetches.
    struct StubStore {
        tasks: Mutex<Vec<TaskView>>,
        failures_remaining: AtomicUsize,
        fetch_count: AtomicUsize,
    }

    impl StubStore {
        fn new(tasks: Vec<TaskView>) -> Self {
            Self {
                tasks: Mutex::new(tasks),
                failures_remaining: AtomicUsize::new(0),
                fetch_count: AtomicUsize::new(0),
            }
        }

        fn failing(tasks: Vec<TaskView>, failures: usize) -> Self {
            let store = Self::new(tasks);
            store.failures_remaining.store(failures, Ordering::SeqCst);
            store
        }
    }

    #[async_trait::async_trait]
    impl TaskStore for StubStore {
        async fn add_task(&self, _owner: &str, _fields: NewTask) -> crate::store::StoreOutcome {
            unimplemented!()
        }
        async fn list_tasks(
            &self,
            _owner: &str,
            _filter: TaskFilter,
        ) -> crate::store::StoreOutcome {
            unimplemented!()
        }
        async fn get_task(&self, _owner: &str, _id: &str) -> Option<TaskView> {
            None
        }
        async fn update_task(
            &self,
            _owner: &str,
            _id: &str,
            _patch: TaskPatch,
        ) -> crate::store::StoreOutcome {
            unimplemented!()
        }
        async fn set_completion(
            &self,
            _owner: &str,
            _id: &str,
            _completed: bool,
        ) -> crate::store::StoreOutcome {
            unimplemented!()
        }
        async fn delete_task(&self, _owner: &str, _id: &str) -> crate::store::StoreOutcome {
            unimplemented!()
        }
        async fn identity(&self, _owner: &str) -> crate::store::StoreOutcome {
            unimplemented!()
        }
        async fn fetch_all(&self, _owner: &str) -> Result<Vec<TaskView>, StoreError> {
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Invalid("simulated outage".to_string()));
            }
            Ok(self.tasks.lock().await.clone())
        }
    }

    #[test]
    fn test_position_detection() {
        assert!(Resolver::is_position("1"));
        assert!(Resolver::is_position("42"));
        assert!(!Resolver::is_position(""));
        assert!(!Resolver::is_position("abc"));
        assert!(!Resolver::is_position("c27fb365-0c84-4cf2-8555-814bb065e448"));
        assert!(!Resolver::is_position("12345678901"));
    }

    #[test]
    fn test_freshness_boundary() {
        let snapshot = Snapshot::capture(&[view("a", "A")]);
        let t = Instant::now();

        assert!(snapshot.is_fresh_at(t + Duration::from_secs(299)));
        assert!(!snapshot.is_fresh_at(t + Duration::from_secs(301)));
    }

    #[tokio::test]
    async fn test_resolve_in_and_out_of_range() {
        let store = StubStore::new(vec![view("a", "A"), view("b", "B"), view("c", "C")]);
        let resolver = Resolver::new();

        for (position, id) in [(1, "a"), (2, "b"), (3, "c")] {
            let resolution = resolver
                .resolve(&store, "owner-1", &position.to_string())
                .await;
            match resolution {
                Resolution::Resolved { task_id, .. } => assert_eq!(task_id, id),
                other => panic!("Expected resolution, got {:?}", other),
            }
        }

        let resolution = resolver.resolve(&store, "owner-1", "7").await;
        assert_eq!(
            resolution,
            Resolution::OutOfRange {
                position: 7,
                available: 3
            }
        );

        let resolution = resolver.resolve(&store, "owner-1", "0").await;
        assert_eq!(
            resolution,
            Resolution::OutOfRange {
                position: 0,
                available: 3
            }
        );
    }

    #[tokio::test]
    async fn test_non_positional_passes_through() {
        let store = StubStore::new(vec![]);
        let resolver = Resolver::new();

        let resolution = resolver
            .resolve(&store, "owner-1", "c27fb365-0c84-4cf2-8555-814bb065e448")
            .await;
        assert_eq!(resolution, Resolution::Verbatim);
        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fresh_cache_hit_skips_store() {
        let store = StubStore::new(vec![view("a", "A"), view("b", "B")]);
        let resolver = Resolver::new();

        let _ = resolver.resolve(&store, "owner-1", "1").await;
        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 1);

        let resolution = resolver.resolve(&store, "owner-1", "2").await;
        assert!(matches!(resolution, Resolution::Resolved { .. }));
        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_cache_forces_refetch() {
        let store = StubStore::new(vec![view("a", "A")]);
        let resolver = Resolver::new();

        let _ = resolver.resolve(&store, "owner-1", "1").await;
        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 1);

        // Age the snapshot past the freshness window
        {
            let slot = resolver.cache().slot("owner-1").await;
            let mut guard = slot.lock().await;
            if let Some(snapshot) = guard.as_mut() {
                snapshot.backdate(FRESHNESS_WINDOW + Duration::from_secs(1));
            }
        }

        let resolution = resolver.resolve(&store, "owner-1", "1").await;
        assert!(matches!(resolution, Resolution::Resolved { .. }));
        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_once_then_unavailable() {
        // One failure: first fetch fails, retry succeeds
        let store = StubStore::failing(vec![view("a", "A")], 1);
        let resolver = Resolver::new();
        let resolution = resolver.resolve(&store, "owner-1", "1").await;
        assert!(matches!(resolution, Resolution::Resolved { .. }));
        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 2);

        // Two failures: both attempts fail, no third attempt
        let store = StubStore::failing(vec![view("a", "A")], 2);
        let resolver = Resolver::new();
        let resolution = resolver.resolve(&store, "owner-1", "1").await;
        assert_eq!(resolution, Resolution::StoreUnavailable);
        assert_eq!(store.fetch_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rebuild_after_deletion_renumbers() {
        let store = StubStore::new(vec![view("a", "A"), view("b", "B"), view("c", "C")]);
        let resolver = Resolver::new();

        let resolution = resolver.resolve(&store, "owner-1", "2").await;
        match resolution {
            Resolution::Resolved { task_id, .. } => assert_eq!(task_id, "b"),
            other => panic!("Expected resolution, got {:?}", other),
        }

        // B is deleted; refresh rebuilds the whole snapshot
        {
            let mut tasks = store.tasks.lock().await;
            tasks.retain(|t| t.id != "b");
        }
        resolver.refresh(&store, "owner-1").await.unwrap();

        let resolution = resolver.resolve(&store, "owner-1", "2").await;
        match resolution {
            Resolution::Resolved { task_id, .. } => assert_eq!(task_id, "c"),
            other => panic!("Expected resolution, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_owner_isolation() {
        let store = StubStore::new(vec![view("a", "A")]);
        let resolver = Resolver::new();

        let _ = resolver.resolve(&store, "owner-1", "1").await;

        // A different owner never sees owner-1's snapshot
        assert!(resolver.cache().get("owner-2", 1).await.is_none());
    }

    #[tokio::test]
    async fn test_get_for_unknown_owner_does_not_insert() {
        let cache = PositionCache::with_capacity(1);
        cache.rebuild("owner-1", &[view("a", "A")]).await;

        // A missed read neither creates a slot nor evicts owner-1
        assert!(cache.get("owner-2", 1).await.is_none());
        assert_eq!(cache.owner_count().await, 1);
        assert!(cache.get("owner-1", 1).await.is_some());
    }

    #[tokio::test]
    async fn test_cache_lru_eviction() {
        let cache = PositionCache::with_capacity(2);
        cache.rebuild("owner-1", &[view("a", "A")]).await;
        cache.rebuild("owner-2", &[view("b", "B")]).await;
        cache.rebuild("owner-3", &[view("c", "C")]).await;

        assert_eq!(cache.owner_count().await, 2);
        assert!(cache.get("owner-1", 1).await.is_none());
        assert!(cache.get("owner-3", 1).await.is_some());
    }
}
