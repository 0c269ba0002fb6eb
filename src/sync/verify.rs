//! Post-mutation verification against refetched store state.
//!
//! Runs detached from the originating call. Nothing in this module returns
//! an error to a caller: outcomes are cache replacements, log lines, and
//! recorded [`ConsistencyWarning`]s.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::TaskCache;
use crate::client::TaskStore;
use crate::error::SyncError;
use crate::models::{Task, TaskUpdate};

use super::engine::WarningSink;
use super::{ConsistencyWarning, MutationKind};

/// What a refetched collection must show for a mutation to count as applied.
#[derive(Debug, Clone)]
pub(crate) enum Expectation {
    /// The created task id is present.
    Created { task_id: Uuid },
    /// The target is present, its fields reflect the update, and its
    /// `updated_at` moved past the value cached before the mutation (when
    /// one was cached).
    Updated {
        task_id: Uuid,
        update: TaskUpdate,
        prior_updated_at: Option<DateTime<Utc>>,
    },
    /// The target id is absent.
    Deleted { task_id: Uuid },
}

impl Expectation {
    pub(crate) fn kind(&self) -> MutationKind {
        match self {
            Expectation::Created { .. } => MutationKind::Create,
            Expectation::Updated { .. } => MutationKind::Update,
            Expectation::Deleted { .. } => MutationKind::Delete,
        }
    }

    pub(crate) fn task_id(&self) -> Uuid {
        match self {
            Expectation::Created { task_id }
            | Expectation::Updated { task_id, .. }
            | Expectation::Deleted { task_id } => *task_id,
        }
    }

    /// Check a refetched collection, returning the divergence detail on
    /// failure.
    pub(crate) fn check(&self, tasks: &[Task]) -> Result<(), String> {
        match self {
            Expectation::Created { task_id } => {
                if tasks.iter().any(|task| task.id == *task_id) {
                    Ok(())
                } else {
                    Err(format!("created task {task_id} missing from store collection"))
                }
            }
            Expectation::Updated {
                task_id,
                update,
                prior_updated_at,
            } => {
                let Some(task) = tasks.iter().find(|task| task.id == *task_id) else {
                    return Err(format!("updated task {task_id} missing from store collection"));
                };
                if let Some(prior) = prior_updated_at {
                    if task.updated_at == *prior {
                        return Err(format!(
                            "task {task_id} updated_at unchanged after update"
                        ));
                    }
                }
                if !update.matches(task) {
                    return Err(format!(
                        "task {task_id} fields diverge from submitted update"
                    ));
                }
                Ok(())
            }
            Expectation::Deleted { task_id } => {
                if tasks.iter().any(|task| task.id == *task_id) {
                    Err(format!("deleted task {task_id} still present in store collection"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Shared handles a verification continuation needs after its originating
/// call has returned.
pub(crate) struct VerificationContext {
    pub(crate) store: Arc<dyn TaskStore>,
    pub(crate) cache: Arc<TaskCache>,
    pub(crate) warnings: Arc<WarningSink>,
    pub(crate) cancellation: CancellationToken,
    pub(crate) retry_delay: Duration,
}

enum AttemptOutcome {
    Converged,
    Diverged(String),
    FetchFailed(SyncError),
}

async fn attempt(
    ctx: &VerificationContext,
    project_id: Uuid,
    expectation: &Expectation,
) -> AttemptOutcome {
    ctx.cache.mark_stale(project_id);
    match ctx.store.list_tasks(project_id).await {
        Ok(tasks) => match expectation.check(&tasks) {
            Ok(()) => {
                ctx.cache.replace(project_id, tasks);
                AttemptOutcome::Converged
            }
            Err(detail) => AttemptOutcome::Diverged(detail),
        },
        Err(error) => AttemptOutcome::FetchFailed(error),
    }
}

/// Verify one mutation against the store, retrying once after a delay.
///
/// The first pass runs immediately. On mismatch (or refetch failure) one
/// re-verification is scheduled after `retry_delay`; the scheduled pass
/// checks the cancellation token before touching the cache. Persistent
/// divergence records a warning and still adopts the store's collection,
/// so the cache never keeps an optimistic edit the store has contradicted.
pub(crate) async fn verify_and_reconcile(
    ctx: VerificationContext,
    project_id: Uuid,
    expectation: Expectation,
) {
    if ctx.cancellation.is_cancelled() {
        return;
    }

    match attempt(&ctx, project_id, &expectation).await {
        AttemptOutcome::Converged => {
            debug!(
                project_id = %project_id,
                task_id = %expectation.task_id(),
                operation = %expectation.kind(),
                "Verification converged"
            );
            return;
        }
        AttemptOutcome::Diverged(detail) => {
            warn!(
                project_id = %project_id,
                task_id = %expectation.task_id(),
                operation = %expectation.kind(),
                detail = %detail,
                "Verification mismatch, scheduling re-verification"
            );
        }
        AttemptOutcome::FetchFailed(error) => {
            warn!(
                project_id = %project_id,
                task_id = %expectation.task_id(),
                operation = %expectation.kind(),
                error = %error,
                "Verification refetch failed, scheduling re-verification"
            );
        }
    }

    tokio::select! {
        () = ctx.cancellation.cancelled() => {
            debug!(
                project_id = %project_id,
                task_id = %expectation.task_id(),
                "Re-verification cancelled"
            );
            return;
        }
        () = tokio::time::sleep(ctx.retry_delay) => {}
    }

    ctx.cache.mark_stale(project_id);
    match ctx.store.list_tasks(project_id).await {
        Ok(tasks) => {
            if ctx.cancellation.is_cancelled() {
                debug!(
                    project_id = %project_id,
                    task_id = %expectation.task_id(),
                    "Re-verification cancelled before reconciliation"
                );
                return;
            }
            match expectation.check(&tasks) {
                Ok(()) => {
                    info!(
                        project_id = %project_id,
                        task_id = %expectation.task_id(),
                        operation = %expectation.kind(),
                        "Re-verification converged"
                    );
                }
                Err(detail) => {
                    ctx.warnings.record(ConsistencyWarning::new(
                        project_id,
                        expectation.task_id(),
                        expectation.kind(),
                        detail,
                    ));
                }
            }
            // The store's answer wins either way.
            ctx.cache.replace(project_id, tasks);
        }
        Err(error) => {
            // No server collection to adopt; the optimistic entry stays,
            // flagged stale, until the next successful read.
            ctx.warnings.record(ConsistencyWarning::new(
                project_id,
                expectation.task_id(),
                expectation.kind(),
                format!("re-verification fetch failed: {error}"),
            ));
        }
    }
}
