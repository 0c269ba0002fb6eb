//! # Synchronization Layer
//!
//! Mutation pipeline keeping the local task cache convergent with the
//! remote store.
//!
//! ## Overview
//!
//! Every mutation follows the same shape: validate identifiers, issue
//! exactly one store write, merge the acknowledged result into the cache
//! optimistically, then verify in the background that a forced refetch
//! reflects the write. Verification retries once after a short delay; if the
//! store still diverges, a [`ConsistencyWarning`] is recorded and the server
//! state is adopted anyway.
//!
//! ```text
//!  caller ──▶ validate ──▶ store write ──▶ optimistic merge ──▶ returns
//!                                              │
//!                                     (spawned continuation)
//!                                              ▼
//!                            mark stale ──▶ refetch ──▶ verify
//!                                              │            │ mismatch
//!                                     replace cache    delayed re-verify
//!                                                           │ mismatch
//!                                             warning + adopt server state
//! ```
//!
//! See [`engine::SyncEngine`] for the full contract.

pub mod engine;
mod verify;

pub use engine::SyncEngine;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::config::SyncConfig;

/// Kind of store mutation a verification pass follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        };
        f.write_str(label)
    }
}

/// Record of a write the store acknowledged but then failed to reflect.
///
/// This is a diagnostic signal, not an error: by the time a warning is
/// recorded the originating call has long since returned success, and the
/// cache has been reconciled to whatever the store last reported.
#[derive(Debug, Clone, Serialize)]
pub struct ConsistencyWarning {
    pub project_id: Uuid,
    pub task_id: Uuid,
    pub operation: MutationKind,
    /// Human-readable description of the divergence.
    pub detail: String,
    pub occurred_at: DateTime<Utc>,
}

impl ConsistencyWarning {
    pub fn new(
        project_id: Uuid,
        task_id: Uuid,
        operation: MutationKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            project_id,
            task_id,
            operation,
            detail: detail.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Tunable behavior for the synchronization engine.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Pause before the single re-verification attempt.
    pub verify_retry_delay: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            verify_retry_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&SyncConfig> for SyncSettings {
    fn from(config: &SyncConfig) -> Self {
        Self {
            verify_retry_delay: Duration::from_millis(config.verify_retry_delay_ms),
        }
    }
}
