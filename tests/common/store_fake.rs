use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use uuid::Uuid;

use stagecheck_client::client::TaskStore;
use stagecheck_client::error::{SyncError, SyncResult};
use stagecheck_client::models::{NewTask, Task, TaskUpdate};

/// One store call, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreCall {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Default)]
struct StoreState {
    collections: HashMap<Uuid, Vec<Task>>,
    calls: Vec<StoreCall>,
    /// Writes acknowledge and return a record without persisting it.
    ack_without_apply: bool,
    /// Frozen snapshots served for the next N list calls, per project.
    stale_serves: HashMap<Uuid, (Vec<Task>, usize)>,
    /// Remaining list calls that fail with HTTP 503.
    failing_lists: usize,
    /// Remaining write calls that fail, with the status to fail with.
    failing_writes: Option<(usize, u16)>,
    list_delay: Option<Duration>,
}

impl StoreState {
    fn take_write_failure(&mut self) -> Option<SyncError> {
        match &mut self.failing_writes {
            Some((remaining, status)) if *remaining > 0 => {
                *remaining -= 1;
                Some(SyncError::from_status(*status, "write rejected"))
            }
            _ => None,
        }
    }
}

/// In-memory task store fake for engine tests.
///
/// Default behavior matches the hosted service: creates assign server ids
/// and timestamps, updates bump `updated_at`, lists return the live
/// collection. Failure and lag behaviors are switched on per test.
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Install a project's collection directly, bypassing call recording.
    pub fn seed(&self, project_id: Uuid, tasks: Vec<Task>) {
        self.state.lock().collections.insert(project_id, tasks);
    }

    /// The live server-side collection for a project.
    pub fn tasks(&self, project_id: Uuid) -> Vec<Task> {
        self.state
            .lock()
            .collections
            .get(&project_id)
            .cloned()
            .unwrap_or_default()
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().calls.clone()
    }

    /// Number of list calls received so far.
    pub fn list_calls(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| **call == StoreCall::List)
            .count()
    }

    /// Make writes acknowledge without persisting, simulating a store that
    /// accepts a mutation and then loses it.
    pub fn set_ack_without_apply(&self, enabled: bool) {
        self.state.lock().ack_without_apply = enabled;
    }

    /// Freeze the current collection and serve it for the next `count`
    /// list calls, simulating replication lag after a write.
    pub fn serve_stale_lists(&self, project_id: Uuid, count: usize) {
        let mut state = self.state.lock();
        let snapshot = state
            .collections
            .get(&project_id)
            .cloned()
            .unwrap_or_default();
        state.stale_serves.insert(project_id, (snapshot, count));
    }

    /// Fail the next `count` list calls with HTTP 503.
    pub fn fail_lists(&self, count: usize) {
        self.state.lock().failing_lists = count;
    }

    /// Fail the next `count` write calls with the given status.
    pub fn fail_writes(&self, count: usize, status: u16) {
        self.state.lock().failing_writes = Some((count, status));
    }

    /// Delay every list call, giving tests a window to observe optimistic
    /// cache state before verification lands.
    pub fn set_list_delay(&self, delay: Duration) {
        self.state.lock().list_delay = Some(delay);
    }

    /// Server-side write from another client: appears in subsequent lists
    /// without any call having gone through this client.
    pub fn insert_raw(&self, project_id: Uuid, task: Task) {
        self.state
            .lock()
            .collections
            .entry(project_id)
            .or_default()
            .push(task);
    }

    /// Server-side delete from another client.
    pub fn remove_raw(&self, project_id: Uuid, task_id: Uuid) {
        if let Some(tasks) = self.state.lock().collections.get_mut(&project_id) {
            tasks.retain(|task| task.id != task_id);
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn list_tasks(&self, project_id: Uuid) -> SyncResult<Vec<Task>> {
        let delay = self.state.lock().list_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.calls.push(StoreCall::List);
        if state.failing_lists > 0 {
            state.failing_lists -= 1;
            return Err(SyncError::from_status(503, "list unavailable"));
        }
        if let Some((snapshot, remaining)) = state.stale_serves.get_mut(&project_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(snapshot.clone());
            }
        }
        Ok(state
            .collections
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_task(&self, project_id: Uuid, draft: &NewTask) -> SyncResult<Task> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::Create);
        if let Some(err) = state.take_write_failure() {
            return Err(err);
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id,
            text: draft.text.clone(),
            stage: draft.stage,
            origin: draft.origin,
            source_id: draft.source_id.clone(),
            completed: draft.completed,
            notes: draft.notes.clone(),
            priority: draft.priority,
            due_date: draft.due_date,
            owner: draft.owner.clone(),
            status: draft.status.clone(),
            created_at: now,
            updated_at: now,
        };
        if !state.ack_without_apply {
            state
                .collections
                .entry(project_id)
                .or_default()
                .push(task.clone());
        }
        Ok(task)
    }

    async fn update_task(
        &self,
        project_id: Uuid,
        task_id: Uuid,
        update: &TaskUpdate,
    ) -> SyncResult<Task> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::Update);
        if let Some(err) = state.take_write_failure() {
            return Err(err);
        }

        let ack_without_apply = state.ack_without_apply;
        let tasks = state.collections.entry(project_id).or_default();
        let Some(task) = tasks.iter_mut().find(|task| task.id == task_id) else {
            return Err(SyncError::from_status(
                404,
                format!("task {task_id} not found"),
            ));
        };

        let mut updated = task.clone();
        apply_update(&mut updated, update);
        // Clock may not tick between mutation and check; force movement.
        updated.updated_at = Utc::now().max(task.updated_at + chrono::Duration::milliseconds(1));
        if !ack_without_apply {
            *task = updated.clone();
        }
        Ok(updated)
    }

    async fn delete_task(&self, project_id: Uuid, task_id: Uuid) -> SyncResult<()> {
        let mut state = self.state.lock();
        state.calls.push(StoreCall::Delete);
        if let Some(err) = state.take_write_failure() {
            return Err(err);
        }

        let ack_without_apply = state.ack_without_apply;
        let tasks = state.collections.entry(project_id).or_default();
        if !tasks.iter().any(|task| task.id == task_id) {
            return Err(SyncError::from_status(
                404,
                format!("task {task_id} not found"),
            ));
        }
        if !ack_without_apply {
            tasks.retain(|task| task.id != task_id);
        }
        Ok(())
    }
}

fn apply_update(task: &mut Task, update: &TaskUpdate) {
    if let Some(text) = &update.text {
        task.text = text.clone();
    }
    if let Some(stage) = update.stage {
        task.stage = stage;
    }
    if let Some(origin) = update.origin {
        task.origin = origin;
    }
    if let Some(source_id) = &update.source_id {
        task.source_id = source_id.clone();
    }
    if let Some(completed) = update.completed {
        task.completed = completed;
    }
    if let Some(notes) = &update.notes {
        task.notes = notes.clone();
    }
    if let Some(priority) = update.priority {
        task.priority = priority;
    }
    if let Some(due_date) = update.due_date {
        task.due_date = due_date;
    }
    if let Some(owner) = &update.owner {
        task.owner = owner.clone();
    }
    if let Some(status) = &update.status {
        task.status = status.clone();
    }
}
