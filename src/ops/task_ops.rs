use chrono::NaiveDate;

use crate::model::task::{Category, Priority, Task, TaskDraft};

/// Error type for resolving a user-supplied task reference
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task id prefix '{0}' is ambiguous ({1} matches)")]
    Ambiguous(String, usize),
    #[error("task id prefix '{0}' is too short (need at least 4 characters)")]
    PrefixTooShort(String),
}

/// Shortest id prefix accepted by [`resolve_id`]
pub const MIN_PREFIX_LEN: usize = 4;

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

pub fn find_task<'a>(tasks: &'a [Task], id: &str) -> Option<&'a Task> {
    tasks.iter().find(|t| t.id == id)
}

/// Resolve an exact id or a unique id prefix to the full id
pub fn resolve_id(tasks: &[Task], reference: &str) -> Result<String, TaskError> {
    if let Some(task) = find_task(tasks, reference) {
        return Ok(task.id.clone());
    }
    if reference.len() < MIN_PREFIX_LEN {
        return Err(TaskError::PrefixTooShort(reference.to_string()));
    }
    let matches: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.id.starts_with(reference))
        .collect();
    match matches.as_slice() {
        [] => Err(TaskError::NotFound(reference.to_string())),
        [only] => Ok(only.id.clone()),
        many => Err(TaskError::Ambiguous(reference.to_string(), many.len())),
    }
}

/// Ids of all tasks satisfying `predicate`, in collection order
pub fn select_ids(tasks: &[Task], predicate: impl Fn(&Task) -> bool) -> Vec<String> {
    tasks
        .iter()
        .filter(|t| predicate(t))
        .map(|t| t.id.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Single-task changes
// ---------------------------------------------------------------------------

/// Append a task built from `draft`.
///
/// Returns `None` when the text is empty after trimming. The creation
/// timestamp is `now`, bumped past the newest existing task so timestamps
/// strictly increase with insertion.
pub fn add(tasks: &[Task], draft: &TaskDraft, id: String, now: i64) -> Option<Vec<Task>> {
    let text = draft.text.trim();
    if text.is_empty() {
        return None;
    }
    let created_at = match tasks.iter().map(|t| t.created_at).max() {
        Some(newest) if newest >= now => newest.saturating_add(1),
        _ => now,
    };
    let task = Task {
        id,
        text: text.to_string(),
        done: false,
        category: draft.category.clone(),
        priority: draft.priority,
        due_date: draft.due_date,
        created_at,
    };
    let mut next = tasks.to_vec();
    next.push(task);
    Some(next)
}

/// Flip the completion flag of one task
pub fn toggle(tasks: &[Task], id: &str) -> Vec<Task> {
    map_matching(tasks, |t| t.id == id, |t| t.done = !t.done)
}

pub fn delete(tasks: &[Task], id: &str) -> Vec<Task> {
    tasks.iter().filter(|t| t.id != id).cloned().collect()
}

/// Replace a task's text. Empty text (after trimming) leaves it unchanged.
pub fn edit_text(tasks: &[Task], id: &str, text: &str) -> Vec<Task> {
    let text = text.trim();
    if text.is_empty() {
        return tasks.to_vec();
    }
    map_matching(tasks, |t| t.id == id, |t| t.text = text.to_string())
}

pub fn set_due(tasks: &[Task], id: &str, due: Option<NaiveDate>) -> Vec<Task> {
    map_matching(tasks, |t| t.id == id, |t| t.due_date = due)
}

/// Remove every completed task
pub fn clear_done(tasks: &[Task]) -> Vec<Task> {
    tasks.iter().filter(|t| !t.done).cloned().collect()
}

// ---------------------------------------------------------------------------
// Batch changes
// ---------------------------------------------------------------------------

pub fn mark_done(tasks: &[Task], ids: &[String]) -> Vec<Task> {
    map_matching(tasks, |t| ids.contains(&t.id), |t| t.done = true)
}

pub fn mark_undone(tasks: &[Task], ids: &[String]) -> Vec<Task> {
    map_matching(tasks, |t| ids.contains(&t.id), |t| t.done = false)
}

pub fn delete_many(tasks: &[Task], ids: &[String]) -> Vec<Task> {
    tasks
        .iter()
        .filter(|t| !ids.contains(&t.id))
        .cloned()
        .collect()
}

pub fn move_to_category(tasks: &[Task], ids: &[String], category: &Category) -> Vec<Task> {
    map_matching(
        tasks,
        |t| ids.contains(&t.id),
        |t| t.category = category.clone(),
    )
}

pub fn set_priority(tasks: &[Task], ids: &[String], priority: Priority) -> Vec<Task> {
    map_matching(tasks, |t| ids.contains(&t.id), |t| t.priority = priority)
}

/// Copy `tasks`, applying `change` to the copies that match
fn map_matching(
    tasks: &[Task],
    matches: impl Fn(&Task) -> bool,
    change: impl Fn(&mut Task),
) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| {
            let mut t = t.clone();
            if matches(&t) {
                change(&mut t);
            }
            t
        })
        .collect()
}
