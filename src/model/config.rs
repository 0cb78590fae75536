use serde::{Deserialize, Serialize};

use super::task::{Category, Priority};
use crate::ops::view::SortKey;

/// Configuration from config.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub due: DueConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub tasks: TaskDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of retained snapshots (at least 1)
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    crate::ops::history::DEFAULT_LIMIT
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueConfig {
    /// Tasks due within this many days (after today) count as "due soon"
    #[serde(default = "default_soon_days")]
    pub soon_days: i64,
}

impl Default for DueConfig {
    fn default() -> Self {
        DueConfig {
            soon_days: default_soon_days(),
        }
    }
}

fn default_soon_days() -> i64 {
    2
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Sort order used by `list` when `--sort` is not given
    #[serde(default)]
    pub sort: SortKey,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefaults {
    #[serde(default)]
    pub default_category: Category,
    #[serde(default)]
    pub default_priority: Priority,
}
