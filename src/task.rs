//! Task data model for desktodo.
//!
//! A [`Task`] carries a global total order through `order_index`. New tasks
//! are assigned one past the current maximum index; drag reorders renumber
//! the whole list sequentially from zero. Filtering and renumbering are pure
//! functions over task slices so they stay testable without persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

fn default_priority() -> Priority {
    Priority::Medium
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        default_priority()
    }
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// A note attached to a task. The engine treats the note list as opaque
/// content replaced wholesale on update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// The canonical unit of work.
///
/// `title` is non-empty and at most 200 characters, `description` at most
/// 1000; length bounds are enforced by the calling surface, the engine only
/// rejects empty-after-trim titles on create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub order_index: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

impl Task {
    /// Flip completion state while keeping `is_completed` and `completed_at`
    /// in sync: `completed_at` is set exactly when the task is completed.
    pub fn set_completed(&mut self, completed: bool, at: DateTime<Utc>) {
        self.is_completed = completed;
        self.completed_at = if completed { Some(at) } else { None };
        self.updated_at = at;
    }

    pub fn is_overdue(&self) -> bool {
        match self.due_date {
            Some(due) => !self.is_completed && due < Utc::now(),
            None => false,
        }
    }
}

/// Input for creating a task. Everything except the title is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Field-wise update for an existing task. `None` leaves a field unchanged;
/// for clearable fields the inner `Option` distinguishes setting a new value
/// from clearing it.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<Vec<Note>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.tags.is_none()
            && self.notes.is_none()
    }

    /// Merge the patch onto `task`. Timestamps are the caller's concern.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(tags) = &self.tags {
            task.tags = tags.clone();
        }
        if let Some(notes) = &self.notes {
            task.notes = notes.clone();
        }
    }
}

/// Status filter applied to the task list before any search query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskFilter {
    All,
    Active,
    Completed,
}

impl Default for TaskFilter {
    fn default() -> Self {
        TaskFilter::All
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Active => !task.is_completed,
            TaskFilter::Completed => task.is_completed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Active => "active",
            TaskFilter::Completed => "completed",
        }
    }
}

/// Case-insensitive substring match over title, description, and tags.
/// A blank query matches everything.
pub fn matches_query(task: &Task, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    if task.title.to_lowercase().contains(&needle) {
        return true;
    }
    if let Some(description) = &task.description {
        if description.to_lowercase().contains(&needle) {
            return true;
        }
    }
    task.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
}

/// Status filter and search query, AND-composed with the status filter
/// applied first. Output preserves the input order.
pub fn filter_tasks<'a>(tasks: &'a [Task], filter: TaskFilter, query: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|task| filter.matches(task))
        .filter(|task| matches_query(task, query))
        .collect()
}

/// Sort into canonical presentation order: `order_index` ascending. The sort
/// is stable, so equal indices keep their insertion order.
pub fn sort_canonical(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| task.order_index);
}

/// Index assigned to a newly created task: one past the current maximum,
/// floored at zero so the first task in an empty list gets 1.
pub fn next_order_index(tasks: &[Task]) -> i64 {
    let max = tasks
        .iter()
        .map(|task| task.order_index)
        .max()
        .unwrap_or(0);
    max.max(0) + 1
}

/// Move the element at `from` to position `to`, then renumber every task's
/// `order_index` sequentially from zero, preserving the new arrangement
/// exactly. `to` past the end of the list is clamped to the end; `from` out
/// of bounds is an input error. Pure with respect to the input slice.
pub fn move_and_renumber(tasks: &[Task], from: usize, to: usize) -> Result<Vec<Task>> {
    if from >= tasks.len() {
        return Err(Error::InvalidTask(format!(
            "reorder source index {from} is out of bounds (len {})",
            tasks.len()
        )));
    }
    let mut moved = tasks.to_vec();
    let task = moved.remove(from);
    let to = to.min(moved.len());
    moved.insert(to, task);

    let now = Utc::now();
    for (position, task) in moved.iter_mut().enumerate() {
        task.order_index = position as i64;
        task.updated_at = now;
    }
    Ok(moved)
}
