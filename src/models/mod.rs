//! # Data Model
//!
//! Wire-level task representations shared by the store client, the local
//! cache, and the synchronization engine.

pub mod task;

pub use task::{NewTask, Origin, Stage, Task, TaskUpdate};
