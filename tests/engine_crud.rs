use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use desktodo::engine::TaskEngine;
use desktodo::error::Error;
use desktodo::notify::Notifier;
use desktodo::storage::JsonStore;
use desktodo::task::{Priority, TaskDraft, TaskPatch};

fn open_engine(dir: &TempDir) -> TaskEngine<JsonStore> {
    let store = JsonStore::open(dir.path()).expect("store");
    TaskEngine::new(store, Notifier::disabled(), 20).expect("engine")
}

#[test]
fn created_tasks_persist_across_reopen() {
    let dir = TempDir::new().unwrap();

    let mut engine = open_engine(&dir);
    engine.create(TaskDraft::new("buy milk")).unwrap();
    engine.create(TaskDraft::new("walk dog")).unwrap();
    drop(engine);

    let engine = open_engine(&dir);
    let titles: Vec<&str> = engine.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["buy milk", "walk dog"]);
    assert_eq!(engine.tasks()[0].order_index, 1);
    assert_eq!(engine.tasks()[1].order_index, 2);
}

#[test]
fn create_fills_defaults() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let task = engine.create(TaskDraft::new("plain")).unwrap();
    assert_eq!(task.priority, Priority::Medium);
    assert!(!task.is_completed);
    assert!(task.completed_at.is_none());
    assert!(task.description.is_none());
    assert!(task.due_date.is_none());
    assert!(task.tags.is_empty());
    assert!(task.notes.is_empty());
    assert_eq!(task.created_at, task.updated_at);
}

#[test]
fn draft_fields_carry_through() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let due = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();
    let draft = TaskDraft {
        title: "file taxes".to_string(),
        description: Some("gather receipts first".to_string()),
        priority: Priority::High,
        due_date: Some(due),
        tags: vec!["finance".to_string(), "urgent".to_string()],
        ..TaskDraft::default()
    };
    let task = engine.create(draft).unwrap();

    assert_eq!(task.description.as_deref(), Some("gather receipts first"));
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.due_date, Some(due));
    assert_eq!(task.tags, vec!["finance", "urgent"]);
}

#[test]
fn update_merges_patch_and_refreshes_updated_at() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let task = engine.create(TaskDraft::new("draft title")).unwrap();
    let patch = TaskPatch {
        title: Some("final title".to_string()),
        priority: Some(Priority::High),
        ..TaskPatch::default()
    };
    engine.update(task.id, patch).unwrap();

    let updated = engine.task(task.id).unwrap();
    assert_eq!(updated.title, "final title");
    assert_eq!(updated.priority, Priority::High);
    assert_eq!(updated.created_at, task.created_at);
    assert_eq!(updated.order_index, task.order_index);
    assert!(updated.updated_at > task.updated_at);
    drop(engine);

    let engine = open_engine(&dir);
    assert_eq!(engine.task(task.id).unwrap().title, "final title");
}

#[test]
fn patch_distinguishes_clearing_from_leaving_untouched() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let due = Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap();
    let draft = TaskDraft {
        title: "trip prep".to_string(),
        description: Some("book flights".to_string()),
        due_date: Some(due),
        ..TaskDraft::default()
    };
    let task = engine.create(draft).unwrap();

    // Absent fields stay as they are.
    engine
        .update(
            task.id,
            TaskPatch {
                title: Some("trip prep v2".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    let current = engine.task(task.id).unwrap();
    assert_eq!(current.description.as_deref(), Some("book flights"));
    assert_eq!(current.due_date, Some(due));

    // An explicit inner None clears.
    engine
        .update(
            task.id,
            TaskPatch {
                description: Some(None),
                due_date: Some(None),
                ..TaskPatch::default()
            },
        )
        .unwrap();
    let cleared = engine.task(task.id).unwrap();
    assert!(cleared.description.is_none());
    assert!(cleared.due_date.is_none());
}

#[test]
fn toggle_completion_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let task = engine.create(TaskDraft::new("flip me")).unwrap();
    engine.toggle_complete(task.id).unwrap();

    let completed = engine.task(task.id).unwrap();
    assert!(completed.is_completed);
    assert!(completed.completed_at.is_some());
    drop(engine);

    let mut engine = open_engine(&dir);
    assert!(engine.task(task.id).unwrap().is_completed);

    engine.toggle_complete(task.id).unwrap();
    let reopened = engine.task(task.id).unwrap();
    assert!(!reopened.is_completed);
    assert!(reopened.completed_at.is_none());
}

#[test]
fn delete_removes_task_from_disk() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let keep = engine.create(TaskDraft::new("keep")).unwrap();
    let gone = engine.create(TaskDraft::new("gone")).unwrap();
    engine.delete(gone.id).unwrap();
    drop(engine);

    let engine = open_engine(&dir);
    assert_eq!(engine.tasks().len(), 1);
    assert!(engine.task(keep.id).is_some());
    assert!(engine.task(gone.id).is_none());
}

#[test]
fn unknown_task_ids_return_not_found() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);
    engine.create(TaskDraft::new("innocent bystander")).unwrap();

    let missing = Uuid::new_v4();
    assert!(matches!(
        engine.update(missing, TaskPatch::default()),
        Err(Error::TaskNotFound(id)) if id == missing
    ));
    assert!(matches!(
        engine.toggle_complete(missing),
        Err(Error::TaskNotFound(_))
    ));
    assert!(matches!(
        engine.delete(missing),
        Err(Error::TaskNotFound(_))
    ));

    assert!(engine.last_error().unwrap().contains("Task not found"));
    assert_eq!(engine.tasks().len(), 1);
}

#[test]
fn clear_completed_deletes_every_completed_task() {
    let dir = TempDir::new().unwrap();
    let mut engine = open_engine(&dir);

    let a = engine.create(TaskDraft::new("done a")).unwrap();
    engine.create(TaskDraft::new("open b")).unwrap();
    let c = engine.create(TaskDraft::new("done c")).unwrap();
    engine.toggle_complete(a.id).unwrap();
    engine.toggle_complete(c.id).unwrap();

    assert_eq!(engine.clear_completed().unwrap(), 2);
    let titles: Vec<&str> = engine.tasks().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["open b"]);
    drop(engine);

    let engine = open_engine(&dir);
    assert_eq!(engine.tasks().len(), 1);
}
