//! # Local Task Cache
//!
//! Per-project cached view of the store's task collections.
//!
//! ## Overview
//!
//! The cache is a concurrent map from project UUID to one [`CacheEntry`]
//! holding that project's full task collection. Entries carry a staleness
//! flag: the synchronization engine marks an entry stale immediately after a
//! write so that reads fall through to the store until verification has
//! replaced the entry with fresh server state.
//!
//! Addressing is by project UUID only. The disabled cache key sentinel from
//! [`crate::identity::build_cache_key`] never reaches storage; callers must
//! unwrap the key before touching the cache.
//!
//! There is no eviction policy. Entries live until [`TaskCache::remove`] is
//! called when a project view is abandoned.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::Task;

/// One project's cached task collection.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Task collection as of the last store fetch, plus optimistic edits.
    pub tasks: Vec<Task>,
    /// Set between a mutation and its verified refetch.
    pub stale: bool,
    /// When the entry last adopted a full store response.
    pub refreshed_at: DateTime<Utc>,
}

impl CacheEntry {
    fn fresh(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            stale: false,
            refreshed_at: Utc::now(),
        }
    }
}

/// Concurrent per-project task cache.
///
/// All operations take `&self`; the underlying map shards its locks, and
/// each single-entry operation is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct TaskCache {
    entries: DashMap<Uuid, CacheEntry>,
}

impl TaskCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Snapshot a project's entry.
    pub fn get(&self, project_id: Uuid) -> Option<CacheEntry> {
        self.entries
            .get(&project_id)
            .map(|entry| entry.value().clone())
    }

    /// Snapshot a project's task collection.
    pub fn tasks(&self, project_id: Uuid) -> Option<Vec<Task>> {
        self.entries
            .get(&project_id)
            .map(|entry| entry.value().tasks.clone())
    }

    /// True when an entry exists and has not been marked stale.
    pub fn is_fresh(&self, project_id: Uuid) -> bool {
        self.entries
            .get(&project_id)
            .map(|entry| !entry.value().stale)
            .unwrap_or(false)
    }

    /// Adopt a full store response, resetting staleness.
    pub fn replace(&self, project_id: Uuid, tasks: Vec<Task>) {
        self.entries.insert(project_id, CacheEntry::fresh(tasks));
    }

    /// Apply a functional update to a cached collection.
    ///
    /// The closure runs under the entry's lock, making the read-modify-write
    /// atomic. Returns `false` when the project has no entry yet; absent
    /// entries are created only by [`TaskCache::replace`], never here.
    pub fn mutate<F>(&self, project_id: Uuid, apply: F) -> bool
    where
        F: FnOnce(&mut Vec<Task>),
    {
        match self.entries.get_mut(&project_id) {
            Some(mut entry) => {
                apply(&mut entry.tasks);
                true
            }
            None => false,
        }
    }

    /// Flag an entry as stale until the next [`TaskCache::replace`].
    pub fn mark_stale(&self, project_id: Uuid) -> bool {
        match self.entries.get_mut(&project_id) {
            Some(mut entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    /// Drop a project's entry, for example when its view is abandoned.
    pub fn remove(&self, project_id: Uuid) -> Option<CacheEntry> {
        self.entries.remove(&project_id).map(|(_, entry)| entry)
    }

    /// Number of cached projects.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Origin, Stage};

    fn task(project_id: Uuid, text: &str) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            project_id,
            text: text.to_string(),
            stage: Stage::Definition,
            origin: Origin::Custom,
            source_id: None,
            completed: false,
            notes: None,
            priority: None,
            due_date: None,
            owner: None,
            status: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn replace_and_get() {
        let cache = TaskCache::new();
        let project_id = Uuid::new_v4();
        assert!(cache.get(project_id).is_none());
        assert!(cache.is_empty());

        cache.replace(project_id, vec![task(project_id, "one")]);
        let entry = cache.get(project_id).unwrap();
        assert_eq!(entry.tasks.len(), 1);
        assert!(!entry.stale);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn mutate_requires_existing_entry() {
        let cache = TaskCache::new();
        let project_id = Uuid::new_v4();

        assert!(!cache.mutate(project_id, |tasks| tasks.clear()));

        cache.replace(project_id, vec![task(project_id, "one")]);
        let extra = task(project_id, "two");
        assert!(cache.mutate(project_id, |tasks| tasks.push(extra.clone())));
        assert_eq!(cache.tasks(project_id).unwrap().len(), 2);
    }

    #[test]
    fn staleness_lifecycle() {
        let cache = TaskCache::new();
        let project_id = Uuid::new_v4();
        assert!(!cache.mark_stale(project_id));

        cache.replace(project_id, Vec::new());
        assert!(cache.is_fresh(project_id));

        assert!(cache.mark_stale(project_id));
        assert!(!cache.is_fresh(project_id));
        assert!(cache.get(project_id).unwrap().stale);

        // Adopting a store response clears the flag.
        cache.replace(project_id, Vec::new());
        assert!(cache.is_fresh(project_id));
    }

    #[test]
    fn remove_drops_entry() {
        let cache = TaskCache::new();
        let project_id = Uuid::new_v4();
        cache.replace(project_id, vec![task(project_id, "one")]);

        let removed = cache.remove(project_id).unwrap();
        assert_eq!(removed.tasks.len(), 1);
        assert!(cache.get(project_id).is_none());
        assert!(cache.remove(project_id).is_none());
    }

    #[test]
    fn entries_are_isolated_per_project() {
        let cache = TaskCache::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        cache.replace(first, vec![task(first, "a")]);
        cache.replace(second, vec![task(second, "b"), task(second, "c")]);

        cache.mark_stale(first);
        assert!(!cache.is_fresh(first));
        assert!(cache.is_fresh(second));
        assert_eq!(cache.tasks(second).unwrap().len(), 2);
    }
}
