//! # Task Store Access
//!
//! The [`TaskStore`] trait is the seam between the synchronization engine
//! and the remote task service. The production implementation is
//! [`HttpTaskStore`]; tests substitute in-memory fakes.
//!
//! Implementations are stateless request/response translators: exactly one
//! store call per method invocation, no caching, no retries. Recovery
//! decisions belong to the engine above this layer.
//!
//! Callers are responsible for identifier hygiene. `task_id` arguments must
//! already be canonicalized and `source_id` payload fields sanitized; this
//! layer transmits what it is given.

mod http;

pub use http::{HttpTaskStore, TaskStoreConfig};

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::SyncResult;
use crate::models::{NewTask, Task, TaskUpdate};

/// Remote task store operations.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch a project's full task collection.
    ///
    /// GET /v1/projects/{`project_id`}/tasks
    async fn list_tasks(&self, project_id: Uuid) -> SyncResult<Vec<Task>>;

    /// Create a task from a draft. The store assigns the id and timestamps
    /// and returns the authoritative record.
    ///
    /// POST /v1/projects/{`project_id`}/tasks
    async fn create_task(&self, project_id: Uuid, draft: &NewTask) -> SyncResult<Task>;

    /// Apply a partial update and return the updated record.
    ///
    /// PUT /v1/projects/{`project_id`}/tasks/{`task_id`}
    async fn update_task(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        update: &TaskUpdate,
    ) -> SyncResult<Task>;

    /// Delete a task.
    ///
    /// DELETE /v1/projects/{`project_id`}/tasks/{`task_id`}
    async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> SyncResult<()>;
}
