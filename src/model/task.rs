use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Task priority. Declaration order is sort order: high sorts first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Single-character marker used in list output
    pub fn marker(self) -> char {
        match self {
            Priority::High => '!',
            Priority::Medium => ' ',
            Priority::Low => '.',
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(format!(
                "unknown priority '{}' (expected: high, medium, low)",
                s
            )),
        }
    }
}

/// Task category: one of the built-in set, or any free-text label.
///
/// Serialized as a bare string so stored and exported tasks stay flat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Shopping,
    Health,
    Other(String),
}

impl Category {
    /// The built-in categories, in display order
    pub const BUILTIN: [Category; 4] = [
        Category::Personal,
        Category::Work,
        Category::Shopping,
        Category::Health,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Personal => "personal",
            Category::Work => "work",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Other(s) => s,
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "personal" => Category::Personal,
            "work" => Category::Work,
            "shopping" => Category::Shopping,
            "health" => Category::Health,
            _ => Category::Other(s),
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::from(s.to_string())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("category must not be empty".to_string());
        }
        Ok(Category::from(s))
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        match c {
            Category::Other(s) => s,
            builtin => builtin.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single task in the list.
///
/// Field names are camelCase on the wire so JSON backups from earlier
/// versions of the app load unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Opaque unique identifier, never changes once assigned
    pub id: String,
    /// Task text (never empty after trimming)
    pub text: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    /// Calendar due date (`YYYY-MM-DD`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Creation time in milliseconds since the Unix epoch
    pub created_at: i64,
}

impl Task {
    /// Build a task with default category/priority and no due date
    pub fn new(id: impl Into<String>, text: impl Into<String>, created_at: i64) -> Self {
        Task {
            id: id.into(),
            text: text.into(),
            done: false,
            category: Category::default(),
            priority: Priority::default(),
            due_date: None,
            created_at,
        }
    }

    pub fn with_category(mut self, category: impl Into<Category>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn done(mut self) -> Self {
        self.done = true;
        self
    }
}

/// The fields a user supplies when adding a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub text: String,
    pub category: Category,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

impl TaskDraft {
    pub fn new(text: impl Into<String>) -> Self {
        TaskDraft {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Subtask checklist entry, owned by one task via the subtask map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub done: bool,
}
