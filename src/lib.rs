//! desktodo - Task Engine Library
//!
//! This library provides the state-management core of a personal to-do
//! application: task CRUD, undo, ordering, filtering, and data portability.
//!
//! # Core Concepts
//!
//! - **Tasks**: Rich task records with priority, due dates, tags, and notes
//! - **Canonical Order**: One persistent `order_index` ordering for all views
//! - **Undo Log**: Bounded stack of inverse operations, newest first
//! - **Filters**: Status filter and search query composed over the task list
//! - **Portability**: Versioned JSON export/import plus CSV and text renderings
//!
//! # Module Organization
//!
//! - `config`: Configuration loading from `desktodo.toml`
//! - `engine`: The task engine driving every operation
//! - `error`: Error types and result aliases
//! - `export`: Backup documents, import parsing, CSV and text output
//! - `lock`: File locking and atomic writes for concurrency safety
//! - `notify`: Fire-and-forget user notifications
//! - `settings`: Application settings record
//! - `storage`: JSON snapshot persistence behind the `Store` trait
//! - `task`: Task model, filtering, and the reorder algorithm
//! - `undo`: Undo actions and the bounded undo log

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod lock;
pub mod notify;
pub mod settings;
pub mod storage;
pub mod task;
pub mod undo;

pub use error::{Error, Result};
