use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::task::{Category, Task};

/// Which completion states a view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Done,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !task.done,
            StatusFilter::Done => task.done,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(StatusFilter::All),
            "active" => Ok(StatusFilter::Active),
            "done" => Ok(StatusFilter::Done),
            _ => Err(format!(
                "unknown status '{}' (expected: all, active, done)",
                s
            )),
        }
    }
}

/// Category restriction for a view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => task.category == *c,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => CategoryFilter::All,
            other => CategoryFilter::Only(Category::from(other)),
        })
    }
}

/// Sort order for a view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Newest first by creation time
    #[default]
    Date,
    /// High, medium, low; ties keep their existing order
    Priority,
    /// Ascending by text, case-insensitive
    Name,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Date => write!(f, "date"),
            SortKey::Priority => write!(f, "priority"),
            SortKey::Name => write!(f, "name"),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortKey::Date),
            "priority" => Ok(SortKey::Priority),
            "name" => Ok(SortKey::Name),
            _ => Err(format!(
                "unknown sort key '{}' (expected: date, priority, name)",
                s
            )),
        }
    }
}

/// The user's current view selections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewParams {
    pub status: StatusFilter,
    pub category: CategoryFilter,
    pub search: String,
    pub sort: SortKey,
}

/// Counts over the whole collection, independent of the active filters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewStats {
    pub total: usize,
    pub active: usize,
    pub done: usize,
    /// Occurrences per category, in first-appearance order
    pub by_category: IndexMap<Category, usize>,
}

/// Result of running the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedView {
    pub tasks: Vec<Task>,
    pub stats: ViewStats,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Compute the visible task list and the aggregate counts.
///
/// Stages run in order: status, category, search, sort. Inputs are never
/// modified.
pub fn derive_view(tasks: &[Task], params: &ViewParams) -> DerivedView {
    let filtered = filter_tasks(tasks, params);
    DerivedView {
        tasks: sort_tasks(filtered, params.sort),
        stats: compute_stats(tasks),
    }
}

/// Apply the status, category and search stages
pub fn filter_tasks(tasks: &[Task], params: &ViewParams) -> Vec<Task> {
    let needle = params.search.to_lowercase();
    tasks
        .iter()
        .filter(|t| params.status.matches(t))
        .filter(|t| params.category.matches(t))
        .filter(|t| needle.is_empty() || t.text.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Stable sort by the given key
pub fn sort_tasks(mut tasks: Vec<Task>, key: SortKey) -> Vec<Task> {
    match key {
        SortKey::Date => tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortKey::Priority => tasks.sort_by_key(|t| t.priority),
        SortKey::Name => tasks.sort_by(|a, b| locale_cmp(&a.text, &b.text)),
    }
    tasks
}

/// Totals and per-category counts over the unfiltered collection
pub fn compute_stats(tasks: &[Task]) -> ViewStats {
    let mut stats = ViewStats {
        total: tasks.len(),
        ..Default::default()
    };
    for task in tasks {
        if task.done {
            stats.done += 1;
        } else {
            stats.active += 1;
        }
        *stats.by_category.entry(task.category.clone()).or_insert(0) += 1;
    }
    stats
}

/// Distinct categories in first-appearance order
pub fn categories_present(tasks: &[Task]) -> Vec<Category> {
    let mut seen: IndexMap<&Category, ()> = IndexMap::new();
    for task in tasks {
        seen.entry(&task.category).or_insert(());
    }
    seen.into_keys().cloned().collect()
}

/// Case-insensitive ordering; strings equal ignoring case put lowercase first.
fn locale_cmp(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    primary.then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(x, y)| x != y)
            .map(|(x, y)| x.is_uppercase().cmp(&y.is_uppercase()))
            .unwrap_or_else(|| a.len().cmp(&b.len()))
    })
}
