//! Project Loading and View Tests
//!
//! Cover the read side: cache keying, freshness-aware loads, forced
//! refreshes, abandonment, and the read-only projections consumers render.

mod common;

use std::sync::Arc;

use uuid::Uuid;

use stagecheck_client::models::Stage;

use common::{engine_over, stored_task, stored_task_with_source, InMemoryStore};

#[tokio::test]
async fn disabled_cache_keys_load_empty_without_store_calls() {
    let store = Arc::new(InMemoryStore::new());
    let project_id = Uuid::new_v4();
    store.seed(project_id, vec![stored_task(project_id, "unreachable")]);
    let engine = engine_over(&store, 10);

    assert!(engine.load_project(None).await.unwrap().is_empty());
    assert!(engine.load_project(Some("48215")).await.unwrap().is_empty());
    assert!(engine
        .load_project(Some("not-a-uuid"))
        .await
        .unwrap()
        .is_empty());
    assert!(engine.refresh_project("48215").await.unwrap().is_empty());

    assert_eq!(store.list_calls(), 0, "disabled keys must not reach the store");
}

#[tokio::test]
async fn load_serves_fresh_cache_without_refetching() {
    let store = Arc::new(InMemoryStore::new());
    let project_id = Uuid::new_v4();
    let project = project_id.to_string();
    store.seed(
        project_id,
        vec![
            stored_task(project_id, "one"),
            stored_task(project_id, "two"),
        ],
    );
    let engine = engine_over(&store, 10);

    let first = engine.load_project(Some(&project)).await.unwrap();
    let second = engine.load_project(Some(&project)).await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(store.list_calls(), 1, "second load should be served from cache");
}

#[tokio::test]
async fn load_refetches_once_the_entry_is_stale() {
    let store = Arc::new(InMemoryStore::new());
    let project_id = Uuid::new_v4();
    let project = project_id.to_string();
    store.seed(project_id, vec![stored_task(project_id, "one")]);
    let engine = engine_over(&store, 10);

    engine.load_project(Some(&project)).await.unwrap();
    engine.cache().mark_stale(project_id);
    store.insert_raw(project_id, stored_task(project_id, "two"));

    let tasks = engine.load_project(Some(&project)).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(store.list_calls(), 2);
    assert!(engine.cache().is_fresh(project_id));
}

#[tokio::test]
async fn refresh_bypasses_cache_freshness() {
    let store = Arc::new(InMemoryStore::new());
    let project_id = Uuid::new_v4();
    let project = project_id.to_string();
    store.seed(project_id, vec![stored_task(project_id, "one")]);
    let engine = engine_over(&store, 10);

    engine.load_project(Some(&project)).await.unwrap();
    store.insert_raw(project_id, stored_task(project_id, "two"));

    // A plain load would serve the fresh single-task entry.
    let refreshed = engine.refresh_project(&project).await.unwrap();
    assert_eq!(refreshed.len(), 2);
    assert_eq!(store.list_calls(), 2);

    // The refreshed entry is fresh again; loads stop refetching.
    engine.load_project(Some(&project)).await.unwrap();
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test]
async fn abandoning_a_project_drops_its_entry() {
    let store = Arc::new(InMemoryStore::new());
    let project_id = Uuid::new_v4();
    let project = project_id.to_string();
    store.seed(project_id, vec![stored_task(project_id, "one")]);
    let engine = engine_over(&store, 10);

    engine.load_project(Some(&project)).await.unwrap();
    assert!(engine.view(&project).is_some());

    assert!(engine.abandon_project(&project));
    assert!(engine.view(&project).is_none());
    assert!(!engine.abandon_project(&project), "second abandon is a no-op");
    assert!(!engine.abandon_project("48215"));

    // The next load goes back to the store.
    engine.load_project(Some(&project)).await.unwrap();
    assert_eq!(store.list_calls(), 2);
}

#[tokio::test]
async fn views_project_the_cached_collection() {
    let store = Arc::new(InMemoryStore::new());
    let project_id = Uuid::new_v4();
    let project = project_id.to_string();

    let source_uuid = Uuid::new_v4();
    let mut linked = stored_task_with_source(project_id, "linked", &source_uuid.to_string());
    linked.stage = Stage::Delivery;
    let mut done = stored_task(project_id, "done");
    done.stage = Stage::Delivery;
    done.completed = true;
    let open = stored_task(project_id, "open");

    store.seed(project_id, vec![linked.clone(), done.clone(), open.clone()]);
    let engine = engine_over(&store, 10);
    engine.load_project(Some(&project)).await.unwrap();

    let view = engine.view(&project).unwrap();
    assert_eq!(view.len(), 3);
    assert_eq!(view.project_id(), project_id);

    assert_eq!(view.in_stage(Stage::Delivery).len(), 2);
    assert_eq!(view.in_stage(Stage::Definition).len(), 1);
    assert_eq!(view.in_stage(Stage::Closure).len(), 0);

    // Compound source queries reduce to the embedded UUID before matching.
    let hits = view.for_source(&format!("{source_uuid}-kickoff-3"));
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, linked.id);

    assert_eq!(view.completed().len(), 1);
    assert_eq!(view.remaining().len(), 2);
    assert!((view.progress() - 1.0 / 3.0).abs() < 1e-9);

    let summary = view.stage_summary();
    let delivery = summary
        .iter()
        .find(|entry| entry.stage == Stage::Delivery)
        .unwrap();
    assert_eq!(delivery.total, 2);
    assert_eq!(delivery.completed, 1);
}

#[tokio::test]
async fn view_snapshots_do_not_follow_later_refreshes() {
    let store = Arc::new(InMemoryStore::new());
    let project_id = Uuid::new_v4();
    let project = project_id.to_string();
    store.seed(project_id, vec![stored_task(project_id, "one")]);
    let engine = engine_over(&store, 10);

    engine.load_project(Some(&project)).await.unwrap();
    let view = engine.view(&project).unwrap();

    store.insert_raw(project_id, stored_task(project_id, "two"));
    engine.refresh_project(&project).await.unwrap();

    assert_eq!(view.len(), 1, "captured snapshot must stay detached");
    assert_eq!(engine.view(&project).unwrap().len(), 2);
}
