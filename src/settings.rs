//! Application settings model.
//!
//! Settings are stored as a single record beside the task table and travel
//! inside export documents. Every field carries a serde default, so a partial
//! settings object (for example one bundled in an imported backup) merges
//! over the defaults field by field, nested sections included.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Light,
    Dark,
    System,
}

impl Default for Theme {
    fn default() -> Self {
        Theme::System
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskViewMode {
    List,
    Grid,
    Kanban,
}

impl Default for TaskViewMode {
    fn default() -> Self {
        TaskViewMode::List
    }
}

/// Keyboard shortcut map. The engine stores these verbatim; interpreting
/// accelerator strings is the presentation layer's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shortcuts {
    #[serde(default = "default_new_task")]
    pub new_task: String,

    #[serde(default = "default_search")]
    pub search: String,

    #[serde(default = "default_toggle_complete")]
    pub toggle_complete: String,

    #[serde(default = "default_delete_task")]
    pub delete_task: String,

    #[serde(default = "default_undo")]
    pub undo: String,

    #[serde(default = "default_export_data")]
    pub export_data: String,

    #[serde(default = "default_open_settings")]
    pub open_settings: String,

    #[serde(default = "default_clear_selection")]
    pub clear_selection: String,
}

fn default_new_task() -> String {
    "CmdOrCtrl+N".to_string()
}

fn default_search() -> String {
    "CmdOrCtrl+F".to_string()
}

fn default_toggle_complete() -> String {
    "Space".to_string()
}

fn default_delete_task() -> String {
    "Delete".to_string()
}

fn default_undo() -> String {
    "CmdOrCtrl+Z".to_string()
}

fn default_export_data() -> String {
    "CmdOrCtrl+Shift+E".to_string()
}

fn default_open_settings() -> String {
    "CmdOrCtrl+,".to_string()
}

fn default_clear_selection() -> String {
    "Escape".to_string()
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self {
            new_task: default_new_task(),
            search: default_search(),
            toggle_complete: default_toggle_complete(),
            delete_task: default_delete_task(),
            undo: default_undo(),
            export_data: default_export_data(),
            open_settings: default_open_settings(),
            clear_selection: default_clear_selection(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowSize {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

fn default_window_width() -> u32 {
    1000
}

fn default_window_height() -> u32 {
    700
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

/// Window position; `-1, -1` means unplaced (the window manager centers it).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowPosition {
    #[serde(default = "default_window_coordinate")]
    pub x: i32,

    #[serde(default = "default_window_coordinate")]
    pub y: i32,
}

fn default_window_coordinate() -> i32 {
    -1
}

impl Default for WindowPosition {
    fn default() -> Self {
        Self {
            x: default_window_coordinate(),
            y: default_window_coordinate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UiPreferences {
    #[serde(default)]
    pub window_size: WindowSize,

    #[serde(default)]
    pub window_position: WindowPosition,

    #[serde(default)]
    pub sidebar_collapsed: bool,

    #[serde(default)]
    pub task_view_mode: TaskViewMode,

    #[serde(default)]
    pub always_on_top: bool,
}

impl Default for UiPreferences {
    fn default() -> Self {
        Self {
            window_size: WindowSize::default(),
            window_position: WindowPosition::default(),
            sidebar_collapsed: false,
            task_view_mode: TaskViewMode::default(),
            always_on_top: false,
        }
    }
}

/// The single application settings record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub shortcuts: Shortcuts,

    #[serde(default = "default_notifications_enabled")]
    pub notifications_enabled: bool,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default)]
    pub ui_preferences: UiPreferences,

    #[serde(default = "default_auto_backup")]
    pub auto_backup: bool,

    /// Backup interval in hours, consumed by the external scheduler.
    #[serde(default = "default_backup_interval")]
    pub backup_interval: u32,
}

fn default_notifications_enabled() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

fn default_auto_backup() -> bool {
    true
}

fn default_backup_interval() -> u32 {
    24
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            shortcuts: Shortcuts::default(),
            notifications_enabled: default_notifications_enabled(),
            language: default_language(),
            ui_preferences: UiPreferences::default(),
            auto_backup: default_auto_backup(),
            backup_interval: default_backup_interval(),
        }
    }
}

impl AppSettings {
    /// Merge-import from a JSON value: the input must be an object; unknown
    /// fields are ignored, missing fields (nested sections included) fall
    /// back to their defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::InvalidImport(
                "settings must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|err| Error::InvalidImport(format!("invalid settings: {err}")))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|err| Error::InvalidImport(format!("settings are not valid JSON: {err}")))?;
        Self::from_value(value)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
