//! # Task Model
//!
//! Core checklist item model plus the payload types used for store writes.
//!
//! ## Overview
//!
//! A [`Task`] is one checklist item attached to a project, organized by
//! delivery [`Stage`] and tagged with the [`Origin`] that produced it.
//! Identity is store-assigned: clients submit a [`NewTask`] draft and receive
//! the authoritative record back, UUID and timestamps included.
//!
//! Partial updates travel as an explicit [`TaskUpdate`] with one named
//! optional field per mutable column. Absent fields are left unchanged by
//! the store; nullable fields use a nested `Option` so that an explicit
//! `null` can be transmitted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery stage a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Scoping and discovery work.
    Identification,
    /// Requirements and planning work.
    Definition,
    /// Build and rollout work.
    Delivery,
    /// Wrap-up and retrospective work.
    Closure,
}

impl Stage {
    /// All stages in checklist order.
    pub const ALL: [Stage; 4] = [
        Stage::Identification,
        Stage::Definition,
        Stage::Delivery,
        Stage::Closure,
    ];

    /// Stable lowercase label, matching the wire encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Identification => "identification",
            Stage::Definition => "definition",
            Stage::Delivery => "delivery",
            Stage::Closure => "closure",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "identification" => Ok(Stage::Identification),
            "definition" => Ok(Stage::Definition),
            "delivery" => Ok(Stage::Delivery),
            "closure" => Ok(Stage::Closure),
            other => Err(format!("unknown stage '{other}'")),
        }
    }
}

/// Source that produced a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Generated by a project analysis heuristic.
    Heuristic,
    /// Instantiated from a preset success factor.
    Factor,
    /// Mandated by an organizational policy.
    Policy,
    /// Entered manually by a user.
    Custom,
    /// Imported from an external delivery framework.
    Framework,
}

impl Origin {
    /// Stable lowercase label, matching the wire encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Heuristic => "heuristic",
            Origin::Factor => "factor",
            Origin::Policy => "policy",
            Origin::Custom => "custom",
            Origin::Framework => "framework",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Origin {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "heuristic" => Ok(Origin::Heuristic),
            "factor" => Ok(Origin::Factor),
            "policy" => Ok(Origin::Policy),
            "custom" => Ok(Origin::Custom),
            "framework" => Ok(Origin::Framework),
            other => Err(format!("unknown origin '{other}'")),
        }
    }
}

/// A checklist task as stored by the task service.
///
/// `id` and `project_id` are always canonical UUIDs; identifiers that fail
/// the normalizer's shape check never reach the store in these positions.
/// `source_id` is looser: it may hold a canonical UUID, or, for records
/// written before payload sanitization existed, an arbitrary string that
/// other clients still use for addressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub text: String,
    pub stage: Stage,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation draft for a task (without store-generated fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub text: String,
    pub stage: Stage,
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl NewTask {
    /// Create a draft with the required fields only.
    pub fn new(text: impl Into<String>, stage: Stage, origin: Origin) -> Self {
        Self {
            text: text.into(),
            stage,
            origin,
            source_id: None,
            completed: false,
            notes: None,
            priority: None,
            due_date: None,
            owner: None,
            status: None,
        }
    }

    /// Attach a source id linking the draft to its originating artifact.
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    /// Attach free-form notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the priority rank.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the due date.
    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Assign an owner.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the workflow status label.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Mark the draft as already completed.
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// Partial update payload with one named optional field per mutable column.
///
/// `None` means leave the column unchanged. Nullable columns use a nested
/// `Option`, where `Some(None)` serializes as an explicit `null` and clears
/// the stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Option<String>>,
}

impl TaskUpdate {
    /// Update that only flips the completion flag.
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    /// Set the task text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Move the task to another stage.
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Reassign the task origin.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the completion flag.
    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Set or clear the source id. `None` transmits an explicit `null`.
    pub fn with_source_id(mut self, source_id: Option<String>) -> Self {
        self.source_id = Some(source_id);
        self
    }

    /// Set or clear the notes. `None` transmits an explicit `null`.
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    /// Set or clear the priority. `None` transmits an explicit `null`.
    pub fn with_priority(mut self, priority: Option<i32>) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set or clear the due date. `None` transmits an explicit `null`.
    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Set or clear the owner. `None` transmits an explicit `null`.
    pub fn with_owner(mut self, owner: Option<String>) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Set or clear the status label. `None` transmits an explicit `null`.
    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = Some(status);
        self
    }

    /// True when no field would be transmitted.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.stage.is_none()
            && self.origin.is_none()
            && self.source_id.is_none()
            && self.completed.is_none()
            && self.notes.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.owner.is_none()
            && self.status.is_none()
    }

    /// Check whether a stored task reflects every field carried by this
    /// update. Fields the update does not touch are ignored.
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(text) = &self.text {
            if &task.text != text {
                return false;
            }
        }
        if let Some(stage) = self.stage {
            if task.stage != stage {
                return false;
            }
        }
        if let Some(origin) = self.origin {
            if task.origin != origin {
                return false;
            }
        }
        if let Some(source_id) = &self.source_id {
            if &task.source_id != source_id {
                return false;
            }
        }
        if let Some(completed) = self.completed {
            if task.completed != completed {
                return false;
            }
        }
        if let Some(notes) = &self.notes {
            if &task.notes != notes {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(due_date) = self.due_date {
            if task.due_date != due_date {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if &task.owner != owner {
                return false;
            }
        }
        if let Some(status) = &self.status {
            if &task.status != status {
                return false;
            }
        }
        true
    }
}
