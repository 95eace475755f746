use std::cell::{Cell, RefCell};
use std::io::{Error as IoError, ErrorKind as IoErrorKind};
use std::rc::Rc;

use uuid::Uuid;

use desktodo::engine::TaskEngine;
use desktodo::error::{Error, Result};
use desktodo::notify::Notifier;
use desktodo::settings::AppSettings;
use desktodo::storage::{Store, StoreSnapshot};
use desktodo::task::{self, Task};
use desktodo::undo::DEFAULT_UNDO_CAPACITY;

/// Failure switches for [`FlakyStore`]. `Cell` state so tests can flip them
/// through a shared handle while the engine owns the store.
#[derive(Default)]
pub struct Faults {
    /// `update_task` calls to let through before one fails. The fault clears
    /// itself after firing.
    pub updates_before_failure: Cell<Option<usize>>,
    /// Fail every `add_task` call while set.
    pub fail_adds: Cell<bool>,
    /// Fail every `delete_task` call while set.
    pub fail_deletes: Cell<bool>,
}

/// In-memory store with scriptable failures, for exercising the engine's
/// rollback and push-back paths. Clones share state.
#[derive(Clone, Default)]
pub struct FlakyStore {
    state: Rc<RefCell<State>>,
    faults: Rc<Faults>,
}

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    settings: Option<AppSettings>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    /// The persisted task list in canonical order.
    pub fn stored_tasks(&self) -> Vec<Task> {
        let mut tasks = self.state.borrow().tasks.clone();
        task::sort_canonical(&mut tasks);
        tasks
    }
}

fn injected(op: &str) -> Error {
    Error::Io(IoError::new(
        IoErrorKind::Other,
        format!("injected {op} failure"),
    ))
}

impl Store for FlakyStore {
    fn all_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.stored_tasks())
    }

    fn add_task(&self, task: &Task) -> Result<()> {
        if self.faults.fail_adds.get() {
            return Err(injected("add"));
        }
        let mut state = self.state.borrow_mut();
        if state.tasks.iter().any(|existing| existing.id == task.id) {
            return Err(Error::InvalidTask(format!(
                "task already exists: {}",
                task.id
            )));
        }
        state.tasks.push(task.clone());
        Ok(())
    }

    fn update_task(&self, task: &Task) -> Result<()> {
        if let Some(remaining) = self.faults.updates_before_failure.get() {
            if remaining == 0 {
                self.faults.updates_before_failure.set(None);
                return Err(injected("update"));
            }
            self.faults.updates_before_failure.set(Some(remaining - 1));
        }
        let mut state = self.state.borrow_mut();
        let slot = state
            .tasks
            .iter_mut()
            .find(|existing| existing.id == task.id)
            .ok_or(Error::TaskNotFound(task.id))?;
        *slot = task.clone();
        Ok(())
    }

    fn delete_task(&self, id: Uuid) -> Result<()> {
        if self.faults.fail_deletes.get() {
            return Err(injected("delete"));
        }
        let mut state = self.state.borrow_mut();
        let position = state
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        state.tasks.remove(position);
        Ok(())
    }

    fn clear_completed(&self) -> Result<usize> {
        let mut state = self.state.borrow_mut();
        let before = state.tasks.len();
        state.tasks.retain(|task| !task.is_completed);
        Ok(before - state.tasks.len())
    }

    fn search_tasks(&self, query: &str) -> Result<Vec<Task>> {
        Ok(self
            .stored_tasks()
            .into_iter()
            .filter(|t| task::matches_query(t, query))
            .collect())
    }

    fn settings(&self) -> Result<Option<AppSettings>> {
        Ok(self.state.borrow().settings.clone())
    }

    fn update_settings(&self, settings: &AppSettings) -> Result<()> {
        self.state.borrow_mut().settings = Some(settings.clone());
        Ok(())
    }

    fn export_all(&self) -> Result<StoreSnapshot> {
        Ok(StoreSnapshot {
            tasks: self.stored_tasks(),
            settings: self.state.borrow().settings.clone().unwrap_or_default(),
        })
    }
}

/// Engine over a fresh [`FlakyStore`], plus a handle for scripting faults
/// and inspecting persisted state.
pub fn flaky_engine() -> (TaskEngine<FlakyStore>, FlakyStore) {
    let store = FlakyStore::new();
    let handle = store.clone();
    let engine =
        TaskEngine::new(store, Notifier::disabled(), DEFAULT_UNDO_CAPACITY).expect("engine");
    (engine, handle)
}
