//! Error types for desktodo
//!
//! Errors fall into three kinds, surfaced through [`Error::kind`]:
//! - Validation: bad input (empty title, malformed import, invalid config)
//! - NotFound: an operation referenced an unknown task id
//! - Storage: persistence read/write failure (IO, parse, lock, corruption)
//!
//! An undo call on an empty log is deliberately not an error; the engine
//! treats it as a silent no-op.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for desktodo operations
#[derive(Error, Debug)]
pub enum Error {
    // Validation
    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Invalid import document: {0}")]
    InvalidImport(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Not found
    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    // Storage failures
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition timed out: {0}")]
    LockTimeout(PathBuf),

    #[error("Corrupt data file {path}: {detail}")]
    Corrupt { path: PathBuf, detail: String },
}

/// Coarse classification of an [`Error`], used for last-error reporting
/// and notification payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Storage => "storage",
        }
    }
}

impl Error {
    /// Get the kind classification for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidTask(_) | Error::InvalidImport(_) | Error::InvalidConfig(_) => {
                ErrorKind::Validation
            }

            Error::TaskNotFound(_) => ErrorKind::NotFound,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockTimeout(_)
            | Error::Corrupt { .. } => ErrorKind::Storage,
        }
    }
}

/// Result type alias for desktodo operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_classify_variants() {
        assert_eq!(
            Error::InvalidTask("empty title".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::TaskNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            Error::LockTimeout(PathBuf::from("/tmp/lock")).kind(),
            ErrorKind::Storage
        );
        assert_eq!(
            Error::Corrupt {
                path: PathBuf::from("tasks.json"),
                detail: "truncated".into(),
            }
            .kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(ErrorKind::Validation.as_str(), "validation");
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::Storage.as_str(), "storage");
    }
}
