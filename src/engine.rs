//! Task engine: canonical task state over a persistent store.
//!
//! [`TaskEngine`] owns the in-memory task list (kept in canonical
//! `order_index` order), the undo log, and the presentation-facing view
//! state (filter, search query, selection). Every mutation follows the same
//! discipline: persist first, then update memory, then record the inverse in
//! the undo log, so a storage failure never leaves memory ahead of disk.
//!
//! Undo pops the most recent entry and applies its inverse through the same
//! persistence path; a failed inverse is pushed back so the log is exactly
//! as it was before the attempt. Undo on an empty log is a silent no-op.
//!
//! Mutating operations additionally mirror their outcome into a last-error
//! string (cleared at the start of each operation) and emit fire-and-forget
//! notifications, gated on the notifications setting.

use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{self, ExportDocument, ImportReport};
use crate::notify::{Destination, Notification, NotificationKind, Notifier};
use crate::settings::AppSettings;
use crate::storage::{JsonStore, Store};
use crate::task::{self, Task, TaskDraft, TaskFilter, TaskPatch};
use crate::undo::{UndoAction, UndoLog, UndoPayload};

/// The task state-management engine.
///
/// One instance per process, constructed at startup and driven by the
/// presentation layer one operation at a time (`&mut self` serializes
/// mutation).
pub struct TaskEngine<S: Store> {
    store: S,
    notifier: Notifier,
    tasks: Vec<Task>,
    filter: TaskFilter,
    search_query: String,
    selected_task_id: Option<Uuid>,
    undo_log: UndoLog,
    last_error: Option<String>,
    settings: AppSettings,
}

impl TaskEngine<JsonStore> {
    /// Open the file-backed engine described by `config`: resolve the data
    /// directory, open the store, and wire the notification sink.
    pub fn open(config: &Config) -> Result<Self> {
        let data_dir = config.resolve_data_dir()?;
        let store = JsonStore::open(data_dir)?;
        let destination = Destination::parse(config.notifications.as_deref());
        let notifier = Notifier::from_destination(destination.as_ref())?;
        Self::new(store, notifier, config.undo_capacity)
    }
}

impl<S: Store> TaskEngine<S> {
    /// Build an engine over `store`, loading persisted tasks and settings.
    pub fn new(store: S, notifier: Notifier, undo_capacity: usize) -> Result<Self> {
        let tasks = store.all_tasks()?;
        let settings = store.settings()?.unwrap_or_default();
        tracing::info!(
            tasks = tasks.len(),
            undo_capacity = undo_capacity,
            "Task engine ready"
        );

        Ok(Self {
            store,
            notifier,
            tasks,
            filter: TaskFilter::default(),
            search_query: String::new(),
            selected_task_id: None,
            undo_log: UndoLog::new(undo_capacity),
            last_error: None,
            settings,
        })
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    /// The canonical task list, `order_index` ascending.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task by id.
    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn selected_task_id(&self) -> Option<Uuid> {
        self.selected_task_id
    }

    /// Message of the most recent failed operation, if the failure has not
    /// been superseded by a later successful operation's start.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_log.can_undo()
    }

    /// Read-only view of the undo log.
    pub fn undo_log(&self) -> &UndoLog {
        &self.undo_log
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// The current filter and search query applied to the canonical list.
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        task::filter_tasks(&self.tasks, self.filter, &self.search_query)
    }

    // =========================================================================
    // View state
    // =========================================================================

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn select_task(&mut self, id: Option<Uuid>) {
        self.selected_task_id = id;
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create a task from `draft`. The title must be non-empty after
    /// trimming; the new task goes to the end of the canonical order.
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task> {
        self.last_error = None;
        let result = self.create_inner(draft);
        self.finish(result)
    }

    fn create_inner(&mut self, draft: TaskDraft) -> Result<Task> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidTask("title must not be empty".to_string()));
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            title,
            description: draft.description,
            priority: draft.priority,
            due_date: draft.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
            is_completed: false,
            order_index: task::next_order_index(&self.tasks),
            tags: draft.tags,
            notes: draft.notes,
        };

        self.store.add_task(&task)?;
        self.tasks.push(task.clone());

        self.undo_log.record(UndoAction::new(
            format!("added task \"{}\"", task.title),
            UndoPayload::TaskAdded { task_id: task.id },
        ));
        tracing::info!(task_id = %task.id, title = %task.title, "Created task");
        self.notify(
            NotificationKind::TaskAdded,
            format!("Task added: {}", task.title),
        );
        Ok(task)
    }

    /// Merge `patch` onto an existing task and refresh its `updated_at`.
    pub fn update(&mut self, id: Uuid, patch: TaskPatch) -> Result<()> {
        self.last_error = None;
        let result = self.update_inner(id, patch);
        self.finish(result)
    }

    fn update_inner(&mut self, id: Uuid, patch: TaskPatch) -> Result<()> {
        let position = self.position_of(id).ok_or(Error::TaskNotFound(id))?;
        let before = self.tasks[position].clone();

        let mut updated = before.clone();
        patch.apply_to(&mut updated);
        updated.updated_at = Utc::now();

        self.store.update_task(&updated)?;
        self.tasks[position] = updated;

        self.undo_log.record(UndoAction::new(
            format!("updated task \"{}\"", before.title),
            UndoPayload::TaskUpdated { before },
        ));
        tracing::info!(task_id = %id, "Updated task");
        Ok(())
    }

    /// Delete a task. Clears the selection if it referenced the deleted
    /// task; undo restores the task with its original `order_index`.
    pub fn delete(&mut self, id: Uuid) -> Result<()> {
        self.last_error = None;
        let result = self.delete_inner(id);
        self.finish(result)
    }

    fn delete_inner(&mut self, id: Uuid) -> Result<()> {
        let position = self.position_of(id).ok_or(Error::TaskNotFound(id))?;
        self.store.delete_task(id)?;
        let task = self.tasks.remove(position);
        if self.selected_task_id == Some(id) {
            self.selected_task_id = None;
        }

        self.undo_log.record(UndoAction::new(
            format!("deleted task \"{}\"", task.title),
            UndoPayload::TaskDeleted { task: task.clone() },
        ));
        tracing::info!(task_id = %id, "Deleted task");
        self.notify(
            NotificationKind::TaskDeleted,
            format!("Task deleted: {}", task.title),
        );
        Ok(())
    }

    /// Flip a task's completion state, keeping `completed_at` in sync.
    pub fn toggle_complete(&mut self, id: Uuid) -> Result<()> {
        self.last_error = None;
        let result = self.toggle_inner(id);
        self.finish(result)
    }

    fn toggle_inner(&mut self, id: Uuid) -> Result<()> {
        let position = self.position_of(id).ok_or(Error::TaskNotFound(id))?;
        let before = self.tasks[position].clone();

        let mut toggled = before.clone();
        toggled.set_completed(!before.is_completed, Utc::now());

        self.store.update_task(&toggled)?;
        let completed = toggled.is_completed;
        let title = toggled.title.clone();
        self.tasks[position] = toggled;

        let description = if completed {
            format!("completed task \"{title}\"")
        } else {
            format!("reopened task \"{title}\"")
        };
        self.undo_log.record(UndoAction::new(
            description,
            UndoPayload::CompletionToggled { before },
        ));
        tracing::info!(task_id = %id, completed = completed, "Toggled completion");
        if completed {
            self.notify(
                NotificationKind::TaskCompleted,
                format!("Task completed: {title}"),
            );
        }
        Ok(())
    }

    /// Move the task at position `from` to position `to` and renumber the
    /// whole list sequentially. `from == to` is an immediate no-op.
    ///
    /// The renumbered indices are persisted task by task; if any write
    /// fails, the already-written records are restored best-effort and the
    /// in-memory list stays at the pre-reorder state.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        self.last_error = None;
        let result = self.reorder_inner(from, to);
        self.finish(result)
    }

    fn reorder_inner(&mut self, from: usize, to: usize) -> Result<()> {
        if from == to {
            return Ok(());
        }

        let before = self.tasks.clone();
        let moved = task::move_and_renumber(&before, from, to)?;

        let mut written = 0;
        for task in &moved {
            match self.store.update_task(task) {
                Ok(()) => written += 1,
                Err(err) => {
                    for task in &moved[..written] {
                        if let Some(original) = before.iter().find(|b| b.id == task.id) {
                            let _ = self.store.update_task(original);
                        }
                    }
                    tracing::warn!(
                        error = %err,
                        restored = written,
                        "Reorder batch failed, restored prior indices"
                    );
                    return Err(err);
                }
            }
        }

        self.tasks = moved;
        self.undo_log.record(UndoAction::new(
            "reordered tasks",
            UndoPayload::TasksReordered { before },
        ));
        tracing::info!(from = from, to = to, "Reordered tasks");
        Ok(())
    }

    /// Delete every completed task in one batch, returning the count
    /// removed. With nothing completed this touches neither storage nor the
    /// undo log.
    pub fn clear_completed(&mut self) -> Result<usize> {
        self.last_error = None;
        let result = self.clear_completed_inner();
        self.finish(result)
    }

    fn clear_completed_inner(&mut self) -> Result<usize> {
        let removed: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| task.is_completed)
            .cloned()
            .collect();
        if removed.is_empty() {
            return Ok(0);
        }

        let count = self.store.clear_completed()?;
        self.tasks.retain(|task| !task.is_completed);

        self.undo_log.record(UndoAction::new(
            format!("cleared {} completed tasks", removed.len()),
            UndoPayload::CompletedCleared { removed },
        ));
        tracing::info!(count = count, "Cleared completed tasks");
        self.notify(
            NotificationKind::CompletedCleared,
            format!("Cleared {count} completed tasks"),
        );
        Ok(count)
    }

    /// Persist and adopt a new settings record.
    pub fn update_settings(&mut self, settings: AppSettings) -> Result<()> {
        self.last_error = None;
        match self.store.update_settings(&settings) {
            Ok(()) => {
                self.settings = settings;
                tracing::info!("Updated settings");
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Re-read the task list from the store, discarding in-memory state.
    pub fn reload(&mut self) -> Result<()> {
        self.last_error = None;
        match self.store.all_tasks() {
            Ok(tasks) => {
                tracing::info!(tasks = tasks.len(), "Reloaded tasks");
                self.tasks = tasks;
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    // =========================================================================
    // Undo
    // =========================================================================

    /// Apply the inverse of the most recent mutation. Returns `Ok(false)`
    /// when the log is empty. The inverse goes through the normal
    /// persistence path but records no new undo entry; if it fails, the
    /// popped entry is pushed back unchanged.
    pub fn undo(&mut self) -> Result<bool> {
        self.last_error = None;
        let Some(action) = self.undo_log.pop() else {
            return Ok(false);
        };

        match self.apply_inverse(&action.payload) {
            Ok(()) => {
                tracing::info!(
                    kind = action.payload.kind(),
                    description = %action.description,
                    "Applied undo"
                );
                self.notify(
                    NotificationKind::UndoApplied,
                    format!("Undid: {}", action.description),
                );
                Ok(true)
            }
            Err(err) => {
                self.undo_log.record(action);
                Err(self.fail(err))
            }
        }
    }

    fn apply_inverse(&mut self, payload: &UndoPayload) -> Result<()> {
        match payload {
            UndoPayload::TaskAdded { task_id } => {
                // The task may have been deleted since; undoing the create
                // is then already done.
                match self.store.delete_task(*task_id) {
                    Ok(()) | Err(Error::TaskNotFound(_)) => {}
                    Err(err) => return Err(err),
                }
                self.tasks.retain(|task| task.id != *task_id);
                if self.selected_task_id == Some(*task_id) {
                    self.selected_task_id = None;
                }
                Ok(())
            }
            UndoPayload::TaskDeleted { task } => {
                self.store.add_task(task)?;
                self.tasks.push(task.clone());
                task::sort_canonical(&mut self.tasks);
                Ok(())
            }
            UndoPayload::TaskUpdated { before }
            | UndoPayload::CompletionToggled { before } => {
                self.store.update_task(before)?;
                if let Some(position) = self.position_of(before.id) {
                    self.tasks[position] = before.clone();
                }
                Ok(())
            }
            UndoPayload::TasksReordered { before } => {
                for task in before {
                    self.store.update_task(task)?;
                }
                self.tasks = before.clone();
                task::sort_canonical(&mut self.tasks);
                Ok(())
            }
            UndoPayload::CompletedCleared { removed } => {
                for task in removed {
                    self.store.add_task(task)?;
                }
                self.tasks.extend(removed.iter().cloned());
                task::sort_canonical(&mut self.tasks);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Export / import
    // =========================================================================

    /// Snapshot everything as a versioned backup document.
    pub fn export_document(&mut self) -> Result<ExportDocument> {
        match self.export_inner() {
            Ok(document) => Ok(document),
            Err(err) => {
                tracing::warn!(error = %err, "Export failed");
                self.notify(NotificationKind::Error, err.to_string());
                Err(err)
            }
        }
    }

    fn export_inner(&mut self) -> Result<ExportDocument> {
        let snapshot = self.store.export_all()?;
        let document = ExportDocument::from_snapshot(snapshot);
        tracing::info!(tasks = document.metadata.total_tasks, "Exported data");
        self.notify(
            NotificationKind::DataExported,
            format!("Exported {} tasks", document.metadata.total_tasks),
        );
        Ok(document)
    }

    /// Replace all state with the content of an import document.
    ///
    /// The current task set is deleted and the imported one stored in its
    /// place; bundled settings are applied when usable. Undo history and
    /// selection do not survive the replacement.
    pub fn import_document(&mut self, raw: &str) -> Result<ImportReport> {
        match self.import_inner(raw) {
            Ok(report) => Ok(report),
            Err(err) => {
                tracing::warn!(error = %err, "Import failed");
                self.notify(NotificationKind::Error, err.to_string());
                Err(err)
            }
        }
    }

    fn import_inner(&mut self, raw: &str) -> Result<ImportReport> {
        let payload = export::parse_import(raw)?;

        for task in &self.tasks {
            self.store.delete_task(task.id)?;
        }
        let mut imported = payload.tasks;
        task::sort_canonical(&mut imported);
        for task in &imported {
            self.store.add_task(task)?;
        }

        let settings_applied = match payload.settings {
            Some(settings) => {
                self.store.update_settings(&settings)?;
                self.settings = settings;
                true
            }
            None => false,
        };

        let count = imported.len();
        self.tasks = imported;
        self.selected_task_id = None;
        self.undo_log.clear();

        tracing::info!(
            tasks = count,
            settings_applied = settings_applied,
            "Imported data"
        );
        self.notify(
            NotificationKind::DataImported,
            format!("Imported {count} tasks"),
        );
        Ok(ImportReport {
            tasks: count,
            settings_applied,
        })
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn position_of(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        result.map_err(|err| self.fail(err))
    }

    /// Record a failed operation: mirror it into the last-error string and
    /// emit an error notification.
    fn fail(&mut self, err: Error) -> Error {
        self.last_error = Some(err.to_string());
        tracing::warn!(error = %err, kind = err.kind().as_str(), "Operation failed");
        self.notify(NotificationKind::Error, err.to_string());
        err
    }

    /// Fire-and-forget notification, gated on the notifications setting.
    fn notify(&mut self, kind: NotificationKind, message: String) {
        if !self.settings.notifications_enabled {
            return;
        }
        let notification = Notification::new(kind, message);
        if let Err(err) = self.notifier.send(&notification) {
            tracing::warn!(error = %err, "Notification delivery failed");
        }
    }
}
