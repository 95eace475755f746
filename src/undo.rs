//! Bounded undo log of inverse-operation records.
//!
//! Basic semantics:
//! - Every successful mutation appends one entry, after its storage write
//! - The log is a bounded FIFO: past capacity the oldest entry is evicted
//! - `pop` takes the most recent entry (LIFO); applying it is the engine's
//!   job and must not append a new entry (undo is not undoable)
//! - An inverse that fails to apply is pushed back so the log is exactly
//!   as it was before the attempt

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use uuid::Uuid;

use crate::task::Task;

pub const DEFAULT_UNDO_CAPACITY: usize = 20;

/// Data needed to invert one forward operation, one variant per mutation
/// kind so the dispatch in the engine is exhaustively checkable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UndoPayload {
    /// Invert a create by deleting the referenced task.
    TaskAdded { task_id: Uuid },
    /// Invert an update by restoring the pre-update snapshot wholesale.
    TaskUpdated { before: Task },
    /// Invert a delete by re-inserting the snapshot, original index included.
    TaskDeleted { task: Task },
    /// Invert a completion toggle by restoring the pre-toggle snapshot.
    CompletionToggled { before: Task },
    /// Invert a reorder by replacing the whole list with the prior one.
    TasksReordered { before: Vec<Task> },
    /// Invert a bulk clear by re-inserting every removed task.
    CompletedCleared { removed: Vec<Task> },
}

impl UndoPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            UndoPayload::TaskAdded { .. } => "task_added",
            UndoPayload::TaskUpdated { .. } => "task_updated",
            UndoPayload::TaskDeleted { .. } => "task_deleted",
            UndoPayload::CompletionToggled { .. } => "completion_toggled",
            UndoPayload::TasksReordered { .. } => "tasks_reordered",
            UndoPayload::CompletedCleared { .. } => "completed_cleared",
        }
    }
}

/// One inverse-operation record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UndoAction {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub payload: UndoPayload,
}

impl UndoAction {
    pub fn new(description: impl Into<String>, payload: UndoPayload) -> Self {
        Self {
            id: Ulid::new().to_string(),
            timestamp: Utc::now(),
            description: description.into(),
            payload,
        }
    }
}

/// Bounded FIFO queue of undo records, popped LIFO.
#[derive(Debug, Clone)]
pub struct UndoLog {
    entries: VecDeque<UndoAction>,
    capacity: usize,
}

impl Default for UndoLog {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

impl UndoLog {
    /// Capacity below 1 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a record; evicts the oldest entry once past capacity.
    pub fn record(&mut self, action: UndoAction) {
        self.entries.push_back(action);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Take the most recent record.
    pub fn pop(&mut self) -> Option<UndoAction> {
        self.entries.pop_back()
    }

    pub fn latest(&self) -> Option<&UndoAction> {
        self.entries.back()
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
