//! # Synchronization Engine
//!
//! Coordinates task mutations across the store client and the local cache.
//!
//! ## Overview
//!
//! The engine owns no global state: the store and the cache are passed in
//! at construction, so independent engines (one per window, one per test)
//! never share anything implicitly. All mutation methods resolve as soon as
//! the store has acknowledged the write and the optimistic merge has been
//! applied; verification of the write runs in a spawned continuation.
//!
//! ## Identifier handling
//!
//! Mutations accept identifiers as strings because that is what UI layers
//! hold: canonical UUIDs, compound identifiers with provenance suffixes,
//! legacy numeric ids, and transient source-id strings all arrive through
//! the same parameters. The engine normalizes before anything touches the
//! network:
//!
//! - project ids must reduce to a usable cache key, otherwise the mutation
//!   fails validation without a store call;
//! - task ids are canonicalized, then (if still not UUID-shaped) resolved
//!   against the cached collection by source id;
//! - `source_id` payload fields are sanitized, with non-canonical values
//!   coerced to `None`.
//!
//! ## Lifecycle
//!
//! [`SyncEngine::cancel`] stops pending re-verifications from touching the
//! cache. [`SyncEngine::quiesce`] awaits all in-flight verification
//! continuations, which tests use to make background reconciliation
//! deterministic.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stagecheck_client::{
//!     HttpTaskStore, NewTask, Origin, Stage, SyncEngine, SyncSettings, TaskCache,
//!     TaskStoreConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(HttpTaskStore::new(TaskStoreConfig::default())?);
//! let cache = Arc::new(TaskCache::new());
//! let engine = SyncEngine::new(store, cache, SyncSettings::default());
//!
//! let project = "57b8d1f0-4f63-4a3c-9c08-5f9a3a6e2b11";
//! let draft = NewTask::new("Confirm stakeholder list", Stage::Identification, Origin::Custom);
//! let created = engine.create_task(project, draft).await?;
//! println!("created {}", created.id);
//!
//! engine.quiesce().await;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::TaskCache;
use crate::client::TaskStore;
use crate::error::{SyncError, SyncResult};
use crate::identity::{
    build_cache_key, extract_canonical_id, is_legacy_numeric_id, is_valid_uuid, CacheKey,
};
use crate::models::{NewTask, Task, TaskUpdate};
use crate::projections::ProjectView;

use super::verify::{verify_and_reconcile, Expectation, VerificationContext};
use super::{ConsistencyWarning, SyncSettings};

/// Collector for consistency warnings raised by verification continuations.
///
/// The counter is monotonic across drains so long-running sessions can track
/// divergence frequency without retaining every record.
#[derive(Debug, Default)]
pub(crate) struct WarningSink {
    entries: Mutex<Vec<ConsistencyWarning>>,
    total: AtomicU64,
}

impl WarningSink {
    pub(crate) fn record(&self, warning: ConsistencyWarning) {
        warn!(
            project_id = %warning.project_id,
            task_id = %warning.task_id,
            operation = %warning.operation,
            detail = %warning.detail,
            "Consistency warning recorded"
        );
        self.total.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push(warning);
    }

    pub(crate) fn snapshot(&self) -> Vec<ConsistencyWarning> {
        self.entries.lock().clone()
    }

    pub(crate) fn drain(&self) -> Vec<ConsistencyWarning> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub(crate) fn total_recorded(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

/// Task mutation coordinator with optimistic caching and write verification.
pub struct SyncEngine {
    store: Arc<dyn TaskStore>,
    cache: Arc<TaskCache>,
    settings: SyncSettings,
    cancellation: CancellationToken,
    warnings: Arc<WarningSink>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("cached_projects", &self.cache.len())
            .field("verify_retry_delay", &self.settings.verify_retry_delay)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

impl SyncEngine {
    /// Create an engine over an explicit store and cache.
    pub fn new(store: Arc<dyn TaskStore>, cache: Arc<TaskCache>, settings: SyncSettings) -> Self {
        Self {
            store,
            cache,
            settings,
            cancellation: CancellationToken::new(),
            warnings: Arc::new(WarningSink::default()),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Handle to the cache this engine maintains.
    pub fn cache(&self) -> Arc<TaskCache> {
        Arc::clone(&self.cache)
    }

    /// Read-only snapshot of a project's cached tasks.
    ///
    /// `None` when the project id is unusable or nothing is cached yet.
    pub fn view(&self, project_id: &str) -> Option<ProjectView> {
        match build_cache_key(Some(project_id)) {
            CacheKey::Project(id) => ProjectView::capture(&self.cache, id),
            CacheKey::Disabled => None,
        }
    }

    /// Load a project's tasks, serving fresh cache entries without I/O.
    ///
    /// A disabled cache key (absent, legacy numeric, or malformed project
    /// id) yields an empty collection and performs no store call. Stale or
    /// missing entries fall through to the store.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use stagecheck_client::{
    ///     HttpTaskStore, SyncEngine, SyncSettings, TaskCache, TaskStoreConfig,
    /// };
    ///
    /// # tokio_test::block_on(async {
    /// let store = Arc::new(HttpTaskStore::new(TaskStoreConfig::default()).unwrap());
    /// let engine = SyncEngine::new(store, Arc::new(TaskCache::new()), SyncSettings::default());
    ///
    /// // Legacy numeric ids are not addressable: empty data, no store call.
    /// let tasks = engine.load_project(Some("48215")).await.unwrap();
    /// assert!(tasks.is_empty());
    /// # });
    /// ```
    pub async fn load_project(&self, project_id: Option<&str>) -> SyncResult<Vec<Task>> {
        let key = build_cache_key(project_id);
        let CacheKey::Project(project_uuid) = key else {
            debug!(
                project_id = project_id.unwrap_or("<none>"),
                "Cache key disabled, serving empty collection"
            );
            return Ok(Vec::new());
        };

        if let Some(entry) = self.cache.get(project_uuid) {
            if !entry.stale {
                debug!(
                    project_id = %project_uuid,
                    task_count = entry.tasks.len(),
                    "Serving tasks from cache"
                );
                return Ok(entry.tasks);
            }
        }

        self.fetch_and_replace(project_uuid).await
    }

    /// Fetch a project's tasks from the store, bypassing cache freshness.
    ///
    /// Like [`SyncEngine::load_project`], a disabled cache key serves an
    /// empty collection without a store call.
    pub async fn refresh_project(&self, project_id: &str) -> SyncResult<Vec<Task>> {
        let CacheKey::Project(project_uuid) = build_cache_key(Some(project_id)) else {
            debug!(project_id, "Cache key disabled, serving empty collection");
            return Ok(Vec::new());
        };
        self.fetch_and_replace(project_uuid).await
    }

    /// Drop a project's cache entry when its view is abandoned.
    pub fn abandon_project(&self, project_id: &str) -> bool {
        match build_cache_key(Some(project_id)) {
            CacheKey::Project(project_uuid) => {
                let removed = self.cache.remove(project_uuid).is_some();
                if removed {
                    debug!(project_id = %project_uuid, "Dropped cached project");
                }
                removed
            }
            CacheKey::Disabled => false,
        }
    }

    /// Create a task and merge the acknowledged record into the cache.
    ///
    /// Returns after the optimistic merge; a verification continuation runs
    /// in the background according to the pipeline described at the module
    /// level.
    pub async fn create_task(&self, project_id: &str, draft: NewTask) -> SyncResult<Task> {
        let project_uuid = self.addressable_project(project_id)?;
        let draft = Self::sanitize_draft(draft);

        let created = self.store.create_task(project_uuid, &draft).await?;

        self.cache
            .mutate(project_uuid, |tasks| tasks.push(created.clone()));
        info!(
            project_id = %project_uuid,
            task_id = %created.id,
            stage = %created.stage,
            "Created task, verification scheduled"
        );

        self.spawn_verification(
            project_uuid,
            Expectation::Created {
                task_id: created.id,
            },
        );
        Ok(created)
    }

    /// Update a task addressed by any identifier shape the UI holds.
    ///
    /// Compound identifiers are reduced to their embedded UUID; strings
    /// that still are not UUID-shaped are resolved against the cached
    /// collection by source id (first match in list order).
    pub async fn update_task(
        &self,
        project_id: &str,
        task_id: &str,
        update: TaskUpdate,
    ) -> SyncResult<Task> {
        let project_uuid = self.addressable_project(project_id)?;
        let task_uuid = self.resolve_task_id(project_uuid, task_id)?;
        self.update_resolved(project_uuid, task_uuid, update).await
    }

    /// Flip a task's completion flag.
    ///
    /// Reads the current flag from the cache, refreshing from the store
    /// when the project has no cached entry yet.
    pub async fn toggle_completed(&self, project_id: &str, task_id: &str) -> SyncResult<Task> {
        let project_uuid = self.addressable_project(project_id)?;

        // Populate the cache first so source-id resolution can see the
        // collection even when nothing was loaded yet.
        let tasks = match self.cache.tasks(project_uuid) {
            Some(tasks) => tasks,
            None => self.fetch_and_replace(project_uuid).await?,
        };
        let task_uuid = self.resolve_task_id(project_uuid, task_id)?;
        let current = tasks
            .iter()
            .find(|task| task.id == task_uuid)
            .map(|task| task.completed)
            .ok_or_else(|| {
                SyncError::validation(format!("task '{task_uuid}' not found in project"))
            })?;

        self.update_resolved(project_uuid, task_uuid, TaskUpdate::completed(!current))
            .await
    }

    /// Delete a task and remove it from the cache.
    pub async fn delete_task(&self, project_id: &str, task_id: &str) -> SyncResult<()> {
        let project_uuid = self.addressable_project(project_id)?;
        let task_uuid = self.resolve_task_id(project_uuid, task_id)?;

        self.store.delete_task(project_uuid, task_uuid).await?;

        self.cache
            .mutate(project_uuid, |tasks| tasks.retain(|task| task.id != task_uuid));
        info!(
            project_id = %project_uuid,
            task_id = %task_uuid,
            "Deleted task, verification scheduled"
        );

        self.spawn_verification(project_uuid, Expectation::Deleted { task_id: task_uuid });
        Ok(())
    }

    /// Stop pending re-verifications from mutating the cache.
    ///
    /// In-flight store requests are allowed to finish; their results are
    /// discarded. Cancellation is permanent for this engine.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Await every verification continuation spawned so far.
    pub async fn quiesce(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut pending = self.pending.lock();
                pending.drain(..).collect()
            };
            if handles.is_empty() {
                break;
            }
            futures::future::join_all(handles).await;
        }
    }

    /// Warnings recorded since the last [`SyncEngine::drain_warnings`].
    pub fn warnings(&self) -> Vec<ConsistencyWarning> {
        self.warnings.snapshot()
    }

    /// Take and clear the recorded warnings.
    pub fn drain_warnings(&self) -> Vec<ConsistencyWarning> {
        self.warnings.drain()
    }

    /// Total warnings ever recorded by this engine.
    pub fn warning_count(&self) -> u64 {
        self.warnings.total_recorded()
    }

    fn addressable_project(&self, project_id: &str) -> SyncResult<Uuid> {
        match build_cache_key(Some(project_id)) {
            CacheKey::Project(id) => Ok(id),
            CacheKey::Disabled => {
                if is_legacy_numeric_id(project_id) {
                    Err(SyncError::validation(format!(
                        "legacy numeric project id '{project_id}' is no longer addressable"
                    )))
                } else {
                    Err(SyncError::validation(format!(
                        "project id '{project_id}' is not a valid UUID"
                    )))
                }
            }
        }
    }

    /// Resolve a task identifier of any shape to a store UUID.
    fn resolve_task_id(&self, project_id: Uuid, supplied: &str) -> SyncResult<Uuid> {
        let canonical = extract_canonical_id(supplied);
        if is_valid_uuid(canonical) {
            return Uuid::parse_str(canonical).map_err(|e| {
                SyncError::validation(format!("task id '{supplied}' failed to parse: {e}"))
            });
        }

        if is_legacy_numeric_id(supplied) {
            return Err(SyncError::validation(format!(
                "legacy numeric task id '{supplied}' is no longer addressable"
            )));
        }

        // Transient UI strings can match a stored source id. First match in
        // list order wins.
        if let Some(tasks) = self.cache.tasks(project_id) {
            if let Some(task) = tasks
                .iter()
                .find(|task| task.source_id.as_deref() == Some(supplied))
            {
                debug!(
                    project_id = %project_id,
                    source_id = %supplied,
                    task_id = %task.id,
                    "Resolved task id by source id"
                );
                return Ok(task.id);
            }
        }

        Err(SyncError::validation(format!(
            "task id '{supplied}' could not be resolved to a store id"
        )))
    }

    fn sanitize_draft(mut draft: NewTask) -> NewTask {
        if let Some(raw) = draft.source_id.take() {
            draft.source_id = crate::identity::sanitize_source_id(&raw);
            if draft.source_id.is_none() {
                debug!(source_id = %raw, "Discarded non-canonical source id from draft");
            }
        }
        draft
    }

    fn sanitize_update(mut update: TaskUpdate) -> TaskUpdate {
        if let Some(Some(raw)) = &update.source_id {
            let sanitized = crate::identity::sanitize_source_id(raw);
            if sanitized.is_none() {
                debug!(source_id = %raw, "Discarded non-canonical source id from update");
            }
            update.source_id = Some(sanitized);
        }
        update
    }

    async fn update_resolved(
        &self,
        project_uuid: Uuid,
        task_uuid: Uuid,
        update: TaskUpdate,
    ) -> SyncResult<Task> {
        if update.is_empty() {
            return Err(SyncError::validation("update contains no changes"));
        }
        let update = Self::sanitize_update(update);

        let prior_updated_at = self
            .cache
            .tasks(project_uuid)
            .and_then(|tasks| {
                tasks
                    .iter()
                    .find(|task| task.id == task_uuid)
                    .map(|task| task.updated_at)
            });

        let updated = self
            .store
            .update_task(project_uuid, task_uuid, &update)
            .await?;

        self.cache.mutate(project_uuid, |tasks| {
            if let Some(slot) = tasks.iter_mut().find(|task| task.id == task_uuid) {
                *slot = updated.clone();
            }
        });
        info!(
            project_id = %project_uuid,
            task_id = %task_uuid,
            "Updated task, verification scheduled"
        );

        self.spawn_verification(
            project_uuid,
            Expectation::Updated {
                task_id: task_uuid,
                update,
                prior_updated_at,
            },
        );
        Ok(updated)
    }

    async fn fetch_and_replace(&self, project_uuid: Uuid) -> SyncResult<Vec<Task>> {
        let tasks = self.store.list_tasks(project_uuid).await?;
        self.cache.replace(project_uuid, tasks.clone());
        debug!(
            project_id = %project_uuid,
            task_count = tasks.len(),
            "Replaced cached tasks with store state"
        );
        Ok(tasks)
    }

    fn spawn_verification(&self, project_id: Uuid, expectation: Expectation) {
        let ctx = VerificationContext {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            warnings: Arc::clone(&self.warnings),
            cancellation: self.cancellation.clone(),
            retry_delay: self.settings.verify_retry_delay,
        };
        let handle = tokio::spawn(async move {
            verify_and_reconcile(ctx, project_id, expectation).await;
        });

        let mut pending = self.pending.lock();
        pending.retain(|existing| !existing.is_finished());
        pending.push(handle);
    }
}
