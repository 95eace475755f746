//! Export and import documents.
//!
//! A full backup is one JSON document: every task, the settings record, and
//! a metadata block with counts and provenance. The same document is what
//! import accepts back, so backup and restore are symmetric. CSV and plain
//! text renderings exist for taking the task list elsewhere; neither is
//! importable.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::settings::AppSettings;
use crate::storage::StoreSnapshot;
use crate::task::Task;

/// Version written into the `version` and `format_version` fields
pub const EXPORT_FORMAT_VERSION: &str = "1.0.0";

/// Provenance marker written into exports
pub const EXPORT_SOURCE: &str = "desktodo";

/// Counts and provenance carried alongside the exported data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub export_source: String,
    pub format_version: String,
}

/// The complete backup document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub tasks: Vec<Task>,
    pub settings: AppSettings,
    pub metadata: ExportMetadata,
}

impl ExportDocument {
    /// Build a document from a full store snapshot, stamped with the current
    /// time. Tasks keep the snapshot's canonical order.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let total_tasks = snapshot.tasks.len();
        let completed_tasks = snapshot
            .tasks
            .iter()
            .filter(|task| task.is_completed)
            .count();

        Self {
            version: EXPORT_FORMAT_VERSION.to_string(),
            timestamp: Utc::now(),
            tasks: snapshot.tasks,
            settings: snapshot.settings,
            metadata: ExportMetadata {
                total_tasks,
                completed_tasks,
                export_source: EXPORT_SOURCE.to_string(),
                format_version: EXPORT_FORMAT_VERSION.to_string(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// The validated content of an import document.
#[derive(Debug, Clone)]
pub struct ImportPayload {
    pub tasks: Vec<Task>,
    /// Present when the document bundled a usable settings object. A
    /// malformed one is dropped with a warning rather than failing the
    /// whole import.
    pub settings: Option<AppSettings>,
}

/// What an import did: how many tasks replaced the current set, and whether
/// bundled settings were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub tasks: usize,
    pub settings_applied: bool,
}

/// Validate and extract an import document.
///
/// The document must be a JSON object with a `tasks` array whose elements
/// deserialize as tasks; anything else is [`Error::InvalidImport`]. An empty
/// array is a valid vacuous import.
pub fn parse_import(raw: &str) -> Result<ImportPayload> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::InvalidImport(format!("not valid JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidImport("document is not a JSON object".to_string()))?;

    let tasks_value = object
        .get("tasks")
        .ok_or_else(|| Error::InvalidImport("missing tasks array".to_string()))?;
    if !tasks_value.is_array() {
        return Err(Error::InvalidImport("tasks is not an array".to_string()));
    }
    let tasks: Vec<Task> = serde_json::from_value(tasks_value.clone())
        .map_err(|e| Error::InvalidImport(format!("bad task record: {e}")))?;

    let settings = match object.get("settings") {
        Some(settings_value) => match AppSettings::from_value(settings_value.clone()) {
            Ok(settings) => Some(settings),
            Err(err) => {
                tracing::warn!(error = %err, "Ignoring malformed settings in import document");
                None
            }
        },
        None => None,
    };

    Ok(ImportPayload { tasks, settings })
}

fn csv_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Render tasks as CSV. Free-text fields (title, description, tags) are
/// quoted with embedded quotes doubled; the rest are raw.
pub fn to_csv(tasks: &[Task]) -> String {
    let mut lines = Vec::with_capacity(tasks.len() + 1);
    lines.push("ID,Title,Description,Priority,Status,Created,Due Date,Tags".to_string());

    for task in tasks {
        let row = [
            task.id.to_string(),
            csv_quote(&task.title),
            csv_quote(task.description.as_deref().unwrap_or("")),
            task.priority.as_str().to_string(),
            if task.is_completed { "done" } else { "todo" }.to_string(),
            task.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            task.due_date
                .map(|due| due.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_default(),
            csv_quote(&task.tags.join(", ")),
        ];
        lines.push(row.join(","));
    }

    lines.join("\n")
}

/// Render tasks as plain text, one block per task separated by a blank
/// line: a `[x]`/`[ ]` status mark, the priority in brackets, the title,
/// then indented description, due date, and tag lines when present.
pub fn to_text(tasks: &[Task]) -> String {
    let blocks: Vec<String> = tasks
        .iter()
        .map(|task| {
            let mark = if task.is_completed { "[x]" } else { "[ ]" };
            let mut block = format!("{} [{}] {}\n", mark, task.priority.as_str(), task.title);
            if let Some(description) = &task.description {
                block.push_str(&format!("  {description}\n"));
            }
            if let Some(due) = task.due_date {
                block.push_str(&format!("  Due: {}\n", due.format("%Y-%m-%d")));
            }
            if !task.tags.is_empty() {
                block.push_str(&format!("  Tags: {}\n", task.tags.join(", ")));
            }
            block
        })
        .collect();

    blocks.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;
    use uuid::Uuid;

    fn sample(title: &str, order_index: i64) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            priority: Priority::Medium,
            due_date: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            is_completed: false,
            order_index,
            tags: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn snapshot_with(tasks: Vec<Task>) -> StoreSnapshot {
        StoreSnapshot {
            tasks,
            settings: AppSettings::default(),
        }
    }

    #[test]
    fn document_counts_and_provenance() {
        let mut done = sample("done", 1);
        done.set_completed(true, Utc::now());
        let document = ExportDocument::from_snapshot(snapshot_with(vec![done, sample("open", 2)]));

        assert_eq!(document.version, EXPORT_FORMAT_VERSION);
        assert_eq!(document.metadata.total_tasks, 2);
        assert_eq!(document.metadata.completed_tasks, 1);
        assert_eq!(document.metadata.export_source, "desktodo");
    }

    #[test]
    fn exported_document_parses_back_as_import() {
        let document = ExportDocument::from_snapshot(snapshot_with(vec![
            sample("alpha", 1),
            sample("beta", 2),
        ]));
        let json = document.to_json().expect("serialize");

        let payload = parse_import(&json).expect("round trip");
        assert_eq!(payload.tasks.len(), 2);
        assert_eq!(payload.tasks[0].title, "alpha");
        assert!(payload.settings.is_some());
    }

    #[test]
    fn import_rejects_documents_without_tasks_array() {
        for raw in [
            "not json at all",
            "[]",
            "42",
            "{\"settings\": {}}",
            "{\"tasks\": \"none\"}",
            "{\"tasks\": {}}",
        ] {
            let err = parse_import(raw).expect_err(raw);
            assert!(matches!(err, Error::InvalidImport(_)), "{raw}");
        }
    }

    #[test]
    fn import_rejects_malformed_task_elements() {
        let raw = "{\"tasks\": [{\"title\": \"no id or timestamps\"}]}";
        let err = parse_import(raw).expect_err("bad element");
        assert!(matches!(err, Error::InvalidImport(_)));
    }

    #[test]
    fn import_accepts_empty_tasks_array() {
        let payload = parse_import("{\"tasks\": []}").expect("vacuous import");
        assert!(payload.tasks.is_empty());
        assert!(payload.settings.is_none());
    }

    #[test]
    fn malformed_settings_are_dropped_not_fatal() {
        let raw = "{\"tasks\": [], \"settings\": \"dark\"}";
        let payload = parse_import(raw).expect("import succeeds");
        assert!(payload.settings.is_none());
    }

    #[test]
    fn partial_settings_merge_over_defaults() {
        let raw = "{\"tasks\": [], \"settings\": {\"theme\": \"dark\"}}";
        let payload = parse_import(raw).expect("import succeeds");
        let settings = payload.settings.expect("settings applied");
        assert_eq!(settings.language, "en");
        assert!(settings.notifications_enabled);
    }

    #[test]
    fn csv_quotes_free_text_and_joins_tags() {
        let mut task = sample("Say \"hello\"", 1);
        task.description = Some("greet, politely".to_string());
        task.tags = vec!["social".to_string(), "small talk".to_string()];
        task.set_completed(true, Utc::now());

        let csv = to_csv(&[task]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,Title,Description,Priority,Status,Created,Due Date,Tags"
        );
        let row = lines.next().unwrap();
        assert!(row.contains("\"Say \"\"hello\"\"\""));
        assert!(row.contains("\"greet, politely\""));
        assert!(row.contains(",done,"));
        assert!(row.contains("\"social, small talk\""));
    }

    #[test]
    fn csv_renders_missing_fields_empty() {
        let csv = to_csv(&[sample("bare", 1)]);
        let row = csv.lines().nth(1).unwrap();
        // Empty quoted description, empty raw due date, empty quoted tags
        assert!(row.contains(",\"\",medium,todo,"));
        assert!(row.ends_with(",\"\""));
    }

    #[test]
    fn text_blocks_carry_status_priority_and_detail_lines() {
        let mut first = sample("Buy milk", 1);
        first.description = Some("from the corner store".to_string());
        first.due_date = Some("2024-03-01T12:00:00Z".parse().unwrap());
        first.tags = vec!["errands".to_string(), "groceries".to_string()];
        let mut second = sample("Walk dog", 2);
        second.priority = Priority::High;
        second.set_completed(true, Utc::now());

        let text = to_text(&[first, second]);
        let expected_first = "[ ] [medium] Buy milk\n  from the corner store\n  Due: 2024-03-01\n  Tags: errands, groceries\n";
        assert!(text.starts_with(expected_first));
        assert!(text.contains("\n[x] [high] Walk dog\n"));
        // Exactly one blank line between blocks
        assert!(text.contains("groceries\n\n[x]"));
    }

    #[test]
    fn text_of_no_tasks_is_empty() {
        assert_eq!(to_text(&[]), "");
    }
}
