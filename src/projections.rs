//! # Consumer Projections
//!
//! Read-only views over cached task collections for UI consumers.
//!
//! A [`ProjectView`] is a point-in-time snapshot: it holds its own copy of
//! the collection, so subsequent cache replacements never mutate a view a
//! consumer is rendering. Capture a fresh view after awaiting the engine
//! when up-to-date data matters.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cache::TaskCache;
use crate::identity::extract_canonical_id;
use crate::models::{Stage, Task};

/// Completion tally for one delivery stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    pub total: usize,
    pub completed: usize,
}

/// Point-in-time snapshot of a project's cached tasks.
#[derive(Debug, Clone)]
pub struct ProjectView {
    project_id: Uuid,
    tasks: Vec<Task>,
    stale: bool,
    refreshed_at: DateTime<Utc>,
}

impl ProjectView {
    /// Snapshot the cache entry for a project, if one exists.
    pub fn capture(cache: &TaskCache, project_id: Uuid) -> Option<Self> {
        cache.get(project_id).map(|entry| Self {
            project_id,
            tasks: entry.tasks,
            stale: entry.stale,
            refreshed_at: entry.refreshed_at,
        })
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    /// True when a mutation is awaiting verification; the snapshot may be
    /// ahead of or behind the store.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// When the snapshot's entry last adopted a full store response.
    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    /// All tasks in cached list order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look a task up by its store id.
    pub fn find(&self, task_id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    /// Tasks in one delivery stage.
    pub fn in_stage(&self, stage: Stage) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|task| task.stage == stage)
            .collect()
    }

    /// Tasks linked to a source artifact.
    ///
    /// The queried id is reduced to its canonical form first, so compound
    /// identifiers match tasks stored with the embedded UUID. Stored source
    /// ids that predate sanitization are matched verbatim as a fallback.
    pub fn for_source(&self, source_id: &str) -> Vec<&Task> {
        let canonical = extract_canonical_id(source_id);
        self.tasks
            .iter()
            .filter(|task| {
                task.source_id.as_deref() == Some(canonical)
                    || task.source_id.as_deref() == Some(source_id)
            })
            .collect()
    }

    /// Completed tasks.
    pub fn completed(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|task| task.completed).collect()
    }

    /// Tasks still open.
    pub fn remaining(&self) -> Vec<&Task> {
        self.tasks.iter().filter(|task| !task.completed).collect()
    }

    /// Fraction of tasks completed, 0.0 for an empty collection.
    pub fn progress(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        let completed = self.tasks.iter().filter(|task| task.completed).count();
        completed as f64 / self.tasks.len() as f64
    }

    /// Per-stage completion tallies, in checklist order.
    pub fn stage_summary(&self) -> Vec<StageSummary> {
        Stage::ALL
            .iter()
            .map(|&stage| {
                let mut total = 0;
                let mut completed = 0;
                for task in self.tasks.iter().filter(|task| task.stage == stage) {
                    total += 1;
                    if task.completed {
                        completed += 1;
                    }
                }
                StageSummary {
                    stage,
                    total,
                    completed,
                }
            })
            .collect()
    }
}
