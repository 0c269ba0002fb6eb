#![allow(clippy::doc_markdown)] // Allow technical terms like UUID, TOML in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Stagecheck Client
//!
//! Client-resident task synchronization layer for the Stagecheck project
//! checklist service.
//!
//! ## Overview
//!
//! The hosted task store is the single source of truth for checklist tasks;
//! this crate keeps an embedding application's local view of each project
//! converged with it. Every mutation is written through to the store, merged
//! into the local cache optimistically, and then verified against a fresh
//! server fetch. Divergence that survives a delayed re-verification is
//! surfaced as a [`sync::ConsistencyWarning`] rather than an error, and the
//! server's collection replaces the local one regardless.
//!
//! ## Architecture
//!
//! ```text
//!   embedding application
//!        |           \
//!   SyncEngine        ProjectView (read-only snapshots)
//!     |      \              |
//!  TaskStore  TaskCache <---+
//!  (HTTP)     (per-project map)
//!     |
//!  task store REST API
//! ```
//!
//! ## Module Organization
//!
//! - [`identity`] - Project/task identifier validation and normalization
//! - [`models`] - Task data model and wire representations
//! - [`client`] - Stateless HTTP access to the task store
//! - [`cache`] - Per-project local task cache
//! - [`sync`] - Write-through mutation pipeline with delayed verification
//! - [`projections`] - Read-only views for UI consumers
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Console tracing setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use stagecheck_client::cache::TaskCache;
//! use stagecheck_client::client::{HttpTaskStore, TaskStoreConfig};
//! use stagecheck_client::models::{NewTask, Origin, Stage};
//! use stagecheck_client::sync::{SyncEngine, SyncSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = HttpTaskStore::new(TaskStoreConfig::default())?;
//! let engine = SyncEngine::new(
//!     Arc::new(store),
//!     Arc::new(TaskCache::new()),
//!     SyncSettings::default(),
//! );
//!
//! let project = "3f8a2c44-9d1e-4b7a-8c55-2f0e9a6b1d77";
//! engine.load_project(Some(project)).await?;
//! engine
//!     .create_task(
//!         project,
//!         NewTask::new("Confirm rollout window", Stage::Delivery, Origin::Heuristic),
//!     )
//!     .await?;
//!
//! // Let scheduled verification finish before dropping the engine.
//! engine.quiesce().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Identifier Hygiene
//!
//! Store identifiers are canonical hyphenated UUIDs. Inputs arriving from
//! embedding applications may instead be legacy numeric ids (rejected before
//! any request is issued) or compound ids that append suffixes to an
//! embedded UUID (reduced via [`identity::extract_canonical_id`]). See the
//! [`identity`] module for the exact rules.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod models;
pub mod projections;
pub mod sync;

pub use cache::{CacheEntry, TaskCache};
pub use client::{HttpTaskStore, TaskStore, TaskStoreConfig};
pub use config::{ClientConfig, StoreConfig, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use identity::{build_cache_key, extract_canonical_id, is_valid_uuid, CacheKey};
pub use models::{NewTask, Origin, Stage, Task, TaskUpdate};
pub use projections::{ProjectView, StageSummary};
pub use sync::{ConsistencyWarning, MutationKind, SyncEngine, SyncSettings};
