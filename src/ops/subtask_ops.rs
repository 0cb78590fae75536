use serde::Serialize;

use crate::model::state::SubtaskMap;
use crate::model::task::{Subtask, Task};

/// Completion summary for a task's subtasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    /// Rounded to the nearest whole percent; 0 when there are no subtasks
    pub percentage: u8,
}

/// Append a subtask to `task_id`. Returns the new subtask id, or `None`
/// when the text is empty after trimming.
pub fn add_subtask(map: &mut SubtaskMap, task_id: &str, text: &str, id: String) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    map.entry(task_id.to_string()).or_default().push(Subtask {
        id: id.clone(),
        text: text.to_string(),
        done: false,
    });
    Some(id)
}

/// Flip a subtask's completion flag. Returns false if it doesn't exist.
pub fn toggle_subtask(map: &mut SubtaskMap, task_id: &str, subtask_id: &str) -> bool {
    let Some(sub) = map
        .get_mut(task_id)
        .and_then(|subs| subs.iter_mut().find(|s| s.id == subtask_id))
    else {
        return false;
    };
    sub.done = !sub.done;
    true
}

/// Remove one subtask. Returns false if it doesn't exist.
pub fn delete_subtask(map: &mut SubtaskMap, task_id: &str, subtask_id: &str) -> bool {
    let Some(subs) = map.get_mut(task_id) else {
        return false;
    };
    let before = subs.len();
    subs.retain(|s| s.id != subtask_id);
    subs.len() != before
}

/// Subtasks of a task, empty if it has none
pub fn subtasks_of<'a>(map: &'a SubtaskMap, task_id: &str) -> &'a [Subtask] {
    map.get(task_id).map(Vec::as_slice).unwrap_or(&[])
}

pub fn progress(map: &SubtaskMap, task_id: &str) -> Progress {
    let subs = subtasks_of(map, task_id);
    let done = subs.iter().filter(|s| s.done).count();
    let total = subs.len();
    let percentage = if total > 0 {
        ((done as f64 / total as f64) * 100.0).round() as u8
    } else {
        0
    };
    Progress {
        done,
        total,
        percentage,
    }
}

/// Drop all subtasks of a task. Returns the number removed.
pub fn clear_subtasks(map: &mut SubtaskMap, task_id: &str) -> usize {
    map.shift_remove(task_id).map_or(0, |subs| subs.len())
}

/// Drop entries whose owning task is not in `tasks`. Returns the task ids removed.
pub fn prune_orphans(map: &mut SubtaskMap, tasks: &[Task]) -> Vec<String> {
    let orphaned: Vec<String> = map
        .keys()
        .filter(|id| !tasks.iter().any(|t| &t.id == *id))
        .cloned()
        .collect();
    for id in &orphaned {
        map.shift_remove(id);
    }
    orphaned
}
