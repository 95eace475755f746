//! Fire-and-forget user notifications.
//!
//! Notifications are emitted as JSON lines to stdout or a configured file.
//! The engine never depends on delivery succeeding; send failures are logged
//! and swallowed at the call site.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use crate::error::{Error, Result};

pub const NOTIFICATION_SCHEMA_VERSION: &str = "desktodo.notification.v1";

#[derive(Debug, Clone)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "-" {
                return Some(Destination::Stdout);
            }
            Some(Destination::File(PathBuf::from(trimmed)))
        })
    }

    pub fn open(&self) -> Result<Notifier> {
        match self {
            Destination::Stdout => Ok(Notifier::stdout()),
            Destination::File(path) => Notifier::file(path),
        }
    }
}

/// User-visible notification kinds emitted by the engine.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TaskAdded,
    TaskCompleted,
    TaskDeleted,
    CompletedCleared,
    UndoApplied,
    DataExported,
    DataImported,
    Error,
}

/// A structured notification with optional payload.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub schema_version: &'static str,
    pub id: String,
    pub kind: NotificationKind,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            schema_version: NOTIFICATION_SCHEMA_VERSION,
            id: Ulid::new().to_string(),
            kind,
            timestamp: Utc::now(),
            message: message.into(),
            data: None,
        }
    }

    /// Attach a serializable payload to the notification.
    pub fn with_data<T: Serialize>(mut self, data: T) -> Result<Self> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }
}

/// Notification sink that writes JSONL output to a destination. A notifier
/// without a writer silently drops everything.
pub struct Notifier {
    writer: Option<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("enabled", &self.writer.is_some())
            .finish()
    }
}

impl Notifier {
    /// A sink that drops every notification.
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    /// Emit notifications to stdout.
    pub fn stdout() -> Self {
        Self {
            writer: Some(Box::new(std::io::stdout())),
        }
    }

    /// Emit notifications to a file, creating it if necessary.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: Some(Box::new(file)),
        })
    }

    /// Emit notifications to an arbitrary writer.
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Some(writer),
        }
    }

    /// Open the configured destination, or a disabled sink when none is set.
    pub fn from_destination(destination: Option<&Destination>) -> Result<Self> {
        match destination {
            Some(destination) => destination.open(),
            None => Ok(Self::disabled()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Write a single notification as JSONL.
    pub fn send(&mut self, notification: &Notification) -> Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        let serialized = serde_json::to_vec(notification)?;
        writer.write_all(&serialized)?;
        writer.write_all(b"\n")?;
        writer.flush().map_err(Error::Io)?;
        Ok(())
    }
}
