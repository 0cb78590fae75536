use serde_json::Value;

use crate::model::state::{PersistedState, STATE_VERSION, SubtaskMap, Theme};
use crate::model::tag::{Tag, seed_tags};
use crate::model::task::Task;

/// Error type for schema migration
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("state was written by a newer version (schema {found}, this build reads up to {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },
    #[error("state document has no version field")]
    MissingVersion,
    #[error("state document is neither an object nor an array")]
    UnexpectedShape,
    #[error("could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        source: serde_json::Error,
    },
}

/// The per-key files written by the first release, one per stored value
#[derive(Debug, Clone, Default)]
pub struct LegacyFiles {
    /// `todos.json`: array of tasks
    pub todos: Option<String>,
    /// `todo-tags.json`: array of tags
    pub tags: Option<String>,
    /// `subtasks.json`: map of task id to subtasks
    pub subtasks: Option<String>,
    /// `theme`: bare `dark` or `light`
    pub theme: Option<String>,
}

impl LegacyFiles {
    pub fn is_empty(&self) -> bool {
        self.todos.is_none() && self.tags.is_none() && self.subtasks.is_none() && self.theme.is_none()
    }
}

/// Bring a parsed state document up to the current schema.
///
/// Returns the state and whether it had to be upgraded.
/// - a bare array is schema 0: just the task list
/// - an object carries its `version`
pub fn migrate(value: Value) -> Result<(PersistedState, bool), MigrateError> {
    match value {
        Value::Array(_) => {
            let tasks: Vec<Task> = decode(value, "task list")?;
            Ok((
                PersistedState {
                    tasks,
                    ..Default::default()
                },
                true,
            ))
        }
        Value::Object(ref map) => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .ok_or(MigrateError::MissingVersion)?;
            if version > u64::from(STATE_VERSION) {
                return Err(MigrateError::UnsupportedVersion {
                    found: version,
                    supported: STATE_VERSION,
                });
            }
            let state: PersistedState = decode(value, "state")?;
            Ok((state, false))
        }
        _ => Err(MigrateError::UnexpectedShape),
    }
}

/// Fold the legacy per-key files into one current-schema document.
pub fn migrate_legacy(files: &LegacyFiles) -> Result<PersistedState, MigrateError> {
    let tasks: Vec<Task> = match &files.todos {
        Some(text) => parse(text, "todos.json")?,
        None => Vec::new(),
    };
    let tags: Vec<Tag> = match &files.tags {
        Some(text) => parse(text, "todo-tags.json")?,
        None => seed_tags(),
    };
    let subtasks: SubtaskMap = match &files.subtasks {
        Some(text) => parse(text, "subtasks.json")?,
        None => SubtaskMap::new(),
    };
    let theme = files
        .theme
        .as_deref()
        .and_then(|t| t.trim().trim_matches('"').parse::<Theme>().ok())
        .unwrap_or_default();

    Ok(PersistedState {
        version: STATE_VERSION,
        tasks,
        tags,
        subtasks,
        theme,
        recurring: Vec::new(),
    })
}

fn decode<T: serde::de::DeserializeOwned>(value: Value, what: &'static str) -> Result<T, MigrateError> {
    serde_json::from_value(value).map_err(|source| MigrateError::Decode { what, source })
}

fn parse<T: serde::de::DeserializeOwned>(text: &str, what: &'static str) -> Result<T, MigrateError> {
    serde_json::from_str(text).map_err(|source| MigrateError::Decode { what, source })
}
