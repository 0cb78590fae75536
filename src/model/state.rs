use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::recurring::RecurringTask;
use super::tag::{Tag, seed_tags};
use super::task::{Subtask, Task};

/// Schema version written by this build
pub const STATE_VERSION: u32 = 1;

/// Subtasks keyed by owning task id
pub type SubtaskMap = IndexMap<String, Vec<Subtask>>;

/// Color theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Dark => write!(f, "dark"),
            Theme::Light => write!(f, "light"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(format!("unknown theme '{}' (expected: dark, light)", s)),
        }
    }
}

/// Everything persisted between sessions, written as one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default = "seed_tags")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub subtasks: SubtaskMap,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub recurring: Vec<RecurringTask>,
}

impl Default for PersistedState {
    fn default() -> Self {
        PersistedState {
            version: STATE_VERSION,
            tasks: Vec::new(),
            tags: seed_tags(),
            subtasks: SubtaskMap::new(),
            theme: Theme::default(),
            recurring: Vec::new(),
        }
    }
}

/// Undo history as stored in the sidecar file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub cursor: usize,
    pub snapshots: Vec<Vec<Task>>,
}
