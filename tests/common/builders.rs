//! Test data builders for store collections and engine wiring.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use stagecheck_client::cache::TaskCache;
use stagecheck_client::client::TaskStore;
use stagecheck_client::models::{NewTask, Origin, Stage, Task};
use stagecheck_client::sync::{SyncEngine, SyncSettings};

use super::store_fake::InMemoryStore;

/// Draft with required fields only.
pub fn draft(text: &str) -> NewTask {
    NewTask::new(text, Stage::Delivery, Origin::Custom)
}

/// Stored task shaped the way the service returns it.
pub fn stored_task(project_id: Uuid, text: &str) -> Task {
    let now = Utc::now();
    Task {
        id: Uuid::new_v4(),
        project_id,
        text: text.to_string(),
        stage: Stage::Definition,
        origin: Origin::Heuristic,
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

/// Stored task linked to a source artifact.
pub fn stored_task_with_source(project_id: Uuid, text: &str, source_id: &str) -> Task {
    let mut task = stored_task(project_id, text);
    task.source_id = Some(source_id.to_string());
    task
}

/// Engine over a fake store with a short re-verification delay, so tests
/// that quiesce stay fast.
pub fn engine_over(store: &Arc<InMemoryStore>, retry_delay_ms: u64) -> SyncEngine {
    SyncEngine::new(
        Arc::clone(store) as Arc<dyn TaskStore>,
        Arc::new(TaskCache::new()),
        SyncSettings {
            verify_retry_delay: Duration::from_millis(retry_delay_ms),
        },
    )
}
