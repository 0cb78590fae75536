use serde::Serialize;

use crate::model::recurring::RecurringTask;
use crate::model::tag::Tag;
use crate::model::task::{Subtask, Task};
use crate::ops::due::DueInfo;
use crate::ops::subtask_ops::Progress;
use crate::ops::view::ViewStats;
use crate::util::unicode::{display_width, fit_to_width};

/// Characters of a task id shown in human output
pub const SHORT_ID_LEN: usize = 8;
/// Cells reserved for task text in list output
pub const TEXT_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DueInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Progress>,
}

#[derive(Serialize)]
pub struct ListJson<'a> {
    pub tasks: Vec<TaskJson<'a>>,
    pub stats: &'a ViewStats,
}

#[derive(Serialize)]
pub struct HistoryJson {
    pub cursor: usize,
    pub snapshots: usize,
    pub limit: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Serialize)]
pub struct AgendaJson<'a> {
    pub overdue: Vec<TaskJson<'a>>,
    pub due_soon: Vec<TaskJson<'a>>,
}

#[derive(Serialize)]
pub struct SubtaskListJson<'a> {
    pub task_id: &'a str,
    pub subtasks: &'a [Subtask],
    pub progress: Progress,
}

#[derive(Serialize)]
pub struct RecurringJson<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub template: &'a RecurringTask,
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Leading characters of an id, for display
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((i, _)) => &id[..i],
        None => id,
    }
}

fn checkbox(done: bool) -> char {
    if done { 'x' } else { ' ' }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task, due: Option<&DueInfo>, progress: Option<Progress>) -> String {
    let mut line = format!(
        "[{}] {:<id_w$} {} {}  {}",
        checkbox(task.done),
        short_id(&task.id),
        task.priority.marker(),
        fit_to_width(&task.text, TEXT_WIDTH),
        task.category,
        id_w = SHORT_ID_LEN,
    );
    if let Some(info) = due {
        line.push_str(&format!("  {}", info.label));
    }
    if let Some(p) = progress.filter(|p| p.total > 0) {
        line.push_str(&format!("  [{}/{}]", p.done, p.total));
    }
    line.trim_end().to_string()
}

/// Format the aggregate counts as aligned rows
pub fn format_stats(stats: &ViewStats) -> Vec<String> {
    let mut rows: Vec<(String, usize)> = vec![
        ("Total".to_string(), stats.total),
        ("Active".to_string(), stats.active),
        ("Done".to_string(), stats.done),
    ];
    for (category, count) in &stats.by_category {
        rows.push((format!("  {}", category), *count));
    }
    let label_w = rows
        .iter()
        .map(|(label, _)| display_width(label))
        .max()
        .unwrap_or(0);
    rows.iter()
        .map(|(label, count)| format!("{}  {:>4}", fit_to_width(label, label_w), count))
        .collect()
}

/// Format a subtask with its 1-based position
pub fn format_subtask_line(position: usize, sub: &Subtask) -> String {
    format!("  {:>2}. [{}] {}", position, checkbox(sub.done), sub.text)
}

pub fn format_progress(progress: &Progress) -> String {
    format!(
        "{}/{} done ({}%)",
        progress.done, progress.total, progress.percentage
    )
}

pub fn format_tag_line(tag: &Tag) -> String {
    format!("{}  {:<8} {}", tag.color, short_id(&tag.id), tag.name)
}

/// Format a recurring template with its 1-based position
pub fn format_recurring_line(position: usize, template: &RecurringTask) -> String {
    format!(
        "{:>2}. {:<8} {} {}  {}",
        position,
        template.frequency.to_string(),
        template.priority.marker(),
        fit_to_width(&template.text, TEXT_WIDTH),
        template.category,
    )
    .trim_end()
    .to_string()
}
