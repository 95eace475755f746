//! Storage layer for desktodo
//!
//! Persists all durable state as JSON files inside a single data directory:
//!
//! ```text
//! <data_dir>/
//!   tasks.json        # Versioned snapshot of every task
//!   settings.json     # Application settings record
//!   store.lock        # Advisory lock guarding mutations
//! ```
//!
//! The engine talks to storage through the [`Store`] trait so tests can swap
//! in in-memory or failure-injecting doubles. [`JsonStore`] is the shipping
//! implementation: every mutation takes the advisory lock, re-reads the
//! snapshot, applies the change, and writes the file back atomically, so a
//! reader never observes a partially written snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::settings::AppSettings;
use crate::task::{self, Task};

/// Name of the task snapshot file
pub const TASKS_FILE: &str = "tasks.json";

/// Name of the settings record file
pub const SETTINGS_FILE: &str = "settings.json";

/// Name of the advisory lock file guarding mutations
pub const STORE_LOCK_FILE: &str = "store.lock";

/// Schema version written into (and required from) the task snapshot
pub const TASKS_SCHEMA_VERSION: &str = "desktodo.tasks.v1";

/// Durable backing for tasks and settings.
///
/// Implementations must keep each call atomic: a failed mutation leaves the
/// stored state exactly as it was before the call.
pub trait Store {
    /// All tasks in canonical order (`order_index` ascending).
    fn all_tasks(&self) -> Result<Vec<Task>>;

    /// Persist a new task. Rejects an id that is already present.
    fn add_task(&self, task: &Task) -> Result<()>;

    /// Replace the stored record for an existing task.
    fn update_task(&self, task: &Task) -> Result<()>;

    /// Remove a task by id.
    fn delete_task(&self, id: Uuid) -> Result<()>;

    /// Remove every completed task, returning how many were removed.
    fn clear_completed(&self) -> Result<usize>;

    /// Case-insensitive substring search over title, description, and tags,
    /// results in canonical order.
    fn search_tasks(&self, query: &str) -> Result<Vec<Task>>;

    /// The stored settings record, if one has been written.
    fn settings(&self) -> Result<Option<AppSettings>>;

    /// Persist the settings record.
    fn update_settings(&self, settings: &AppSettings) -> Result<()>;

    /// Full snapshot of tasks and settings for export/backup.
    fn export_all(&self) -> Result<StoreSnapshot>;
}

/// Everything the store holds, read in one pass. Settings fall back to
/// defaults when no record has been written yet.
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub tasks: Vec<Task>,
    pub settings: AppSettings,
}

/// On-disk shape of `tasks.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TasksDocument {
    schema_version: String,
    generated_at: DateTime<Utc>,
    tasks: Vec<Task>,
}

/// File-backed [`Store`] rooted at a data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    /// Open (creating if needed) a store rooted at `data_dir`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        tracing::debug!(path = %data_dir.display(), "Opened task store");
        Ok(Self { data_dir })
    }

    /// Root directory holding the store's files
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the task snapshot file
    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    /// Path to the settings record file
    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    fn lock_file(&self) -> PathBuf {
        self.data_dir.join(STORE_LOCK_FILE)
    }

    // =========================================================================
    // Snapshot I/O
    // =========================================================================

    /// Read the task snapshot. A missing file is an empty store; a present
    /// but unreadable one is corruption, not silence.
    fn read_tasks(&self) -> Result<Vec<Task>> {
        let path = self.tasks_file();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&path)?;
        let document: TasksDocument =
            serde_json::from_str(&content).map_err(|e| Error::Corrupt {
                path: path.clone(),
                detail: e.to_string(),
            })?;

        if document.schema_version != TASKS_SCHEMA_VERSION {
            return Err(Error::Corrupt {
                path,
                detail: format!(
                    "unsupported schema version {:?} (expected {:?})",
                    document.schema_version, TASKS_SCHEMA_VERSION
                ),
            });
        }

        let mut tasks = document.tasks;
        task::sort_canonical(&mut tasks);
        Ok(tasks)
    }

    /// Write the full task snapshot atomically, in canonical order.
    fn write_tasks(&self, tasks: &[Task]) -> Result<()> {
        let mut tasks = tasks.to_vec();
        task::sort_canonical(&mut tasks);

        let count = tasks.len();
        let document = TasksDocument {
            schema_version: TASKS_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            tasks,
        };

        let path = self.tasks_file();
        let json = serde_json::to_string_pretty(&document)?;
        lock::write_atomic(&path, json.as_bytes())?;
        tracing::debug!(path = %path.display(), count = count, "Wrote task snapshot");
        Ok(())
    }

    /// Run a mutation against the snapshot under the store lock:
    /// lock, read, apply, write back atomically.
    fn update_tasks<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Task>) -> Result<T>,
    {
        fs::create_dir_all(&self.data_dir)?;
        let _lock = FileLock::acquire(self.lock_file(), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut tasks = self.read_tasks()?;
        let result = f(&mut tasks)?;
        self.write_tasks(&tasks)?;

        Ok(result)
    }

    fn read_settings(&self) -> Result<Option<AppSettings>> {
        let path = self.settings_file();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let settings: AppSettings =
            serde_json::from_str(&content).map_err(|e| Error::Corrupt {
                path,
                detail: e.to_string(),
            })?;
        Ok(Some(settings))
    }
}

impl Store for JsonStore {
    fn all_tasks(&self) -> Result<Vec<Task>> {
        self.read_tasks()
    }

    fn add_task(&self, task: &Task) -> Result<()> {
        let task = task.clone();
        self.update_tasks(|tasks| {
            if tasks.iter().any(|existing| existing.id == task.id) {
                return Err(Error::InvalidTask(format!(
                    "task already exists: {}",
                    task.id
                )));
            }
            tasks.push(task);
            Ok(())
        })
    }

    fn update_task(&self, task: &Task) -> Result<()> {
        let task = task.clone();
        self.update_tasks(|tasks| {
            let slot = tasks
                .iter_mut()
                .find(|existing| existing.id == task.id)
                .ok_or(Error::TaskNotFound(task.id))?;
            *slot = task;
            Ok(())
        })
    }

    fn delete_task(&self, id: Uuid) -> Result<()> {
        self.update_tasks(|tasks| {
            let position = tasks
                .iter()
                .position(|task| task.id == id)
                .ok_or(Error::TaskNotFound(id))?;
            tasks.remove(position);
            Ok(())
        })
    }

    fn clear_completed(&self) -> Result<usize> {
        self.update_tasks(|tasks| {
            let before = tasks.len();
            tasks.retain(|task| !task.is_completed);
            Ok(before - tasks.len())
        })
    }

    fn search_tasks(&self, query: &str) -> Result<Vec<Task>> {
        let tasks = self.read_tasks()?;
        Ok(tasks
            .into_iter()
            .filter(|task| task::matches_query(task, query))
            .collect())
    }

    fn settings(&self) -> Result<Option<AppSettings>> {
        self.read_settings()
    }

    fn update_settings(&self, settings: &AppSettings) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let _lock = FileLock::acquire(self.lock_file(), DEFAULT_LOCK_TIMEOUT_MS)?;

        let path = self.settings_file();
        let json = serde_json::to_string_pretty(settings)?;
        lock::write_atomic(&path, json.as_bytes())?;
        tracing::debug!(path = %path.display(), "Wrote settings record");
        Ok(())
    }

    fn export_all(&self) -> Result<StoreSnapshot> {
        let tasks = self.read_tasks()?;
        let settings = self.read_settings()?.unwrap_or_default();
        Ok(StoreSnapshot { tasks, settings })
    }
}
