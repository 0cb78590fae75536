use chrono::NaiveDate;
use serde::Serialize;

use crate::model::task::Task;

/// Default "due soon" window in days after today
pub const DEFAULT_SOON_DAYS: i64 = 2;

/// Where a due date falls relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DueStatus {
    Overdue,
    Today,
    Soon,
    Later,
}

/// Due-date summary for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DueInfo {
    pub status: DueStatus,
    /// Whole days from today to the due date (negative when overdue)
    pub days_until: i64,
    pub label: String,
}

impl DueInfo {
    pub fn is_overdue(&self) -> bool {
        self.status == DueStatus::Overdue
    }

    pub fn is_due_today(&self) -> bool {
        self.status == DueStatus::Today
    }

    pub fn is_due_soon(&self) -> bool {
        self.status == DueStatus::Soon
    }
}

/// Classify `due` relative to `today`
pub fn due_info(due: NaiveDate, today: NaiveDate, soon_days: i64) -> DueInfo {
    let days_until = (due - today).num_days();
    let status = match days_until {
        d if d < 0 => DueStatus::Overdue,
        0 => DueStatus::Today,
        d if d <= soon_days => DueStatus::Soon,
        _ => DueStatus::Later,
    };
    let label = match status {
        DueStatus::Overdue => {
            let n = -days_until;
            format!("Overdue by {} day{}", n, if n == 1 { "" } else { "s" })
        }
        DueStatus::Today => "Due today".to_string(),
        DueStatus::Soon if days_until == 1 => "Due tomorrow".to_string(),
        DueStatus::Soon => format!("Due in {} days", days_until),
        DueStatus::Later => format!("Due {}", due.format("%Y-%m-%d")),
    };
    DueInfo {
        status,
        days_until,
        label,
    }
}

/// Due info for a task, if it has a due date
pub fn task_due_info(task: &Task, today: NaiveDate, soon_days: i64) -> Option<DueInfo> {
    task.due_date.map(|d| due_info(d, today, soon_days))
}

/// Open tasks whose due date has passed
pub fn overdue<'a>(tasks: &'a [Task], today: NaiveDate) -> Vec<&'a Task> {
    open_with_due(tasks, today, DEFAULT_SOON_DAYS, DueInfo::is_overdue)
}

/// Open tasks due today or within the soon window
pub fn due_soon<'a>(tasks: &'a [Task], today: NaiveDate, soon_days: i64) -> Vec<&'a Task> {
    open_with_due(tasks, today, soon_days, |i| i.is_due_today() || i.is_due_soon())
}

fn open_with_due<'a>(
    tasks: &'a [Task],
    today: NaiveDate,
    soon_days: i64,
    keep: impl Fn(&DueInfo) -> bool,
) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| !t.done)
        .filter(|t| task_due_info(t, today, soon_days).is_some_and(|i| keep(&i)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const TODAY: (i32, u32, u32) = (2025, 3, 10);

    fn today() -> NaiveDate {
        date(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn labels() {
        let cases = [
            (date(2025, 3, 9), DueStatus::Overdue, "Overdue by 1 day"),
            (date(2025, 3, 1), DueStatus::Overdue, "Overdue by 9 days"),
            (date(2025, 3, 10), DueStatus::Today, "Due today"),
            (date(2025, 3, 11), DueStatus::Soon, "Due tomorrow"),
            (date(2025, 3, 12), DueStatus::Soon, "Due in 2 days"),
            (date(2025, 3, 13), DueStatus::Later, "Due 2025-03-13"),
        ];
        for (due, status, label) in cases {
            let info = due_info(due, today(), DEFAULT_SOON_DAYS);
            assert_eq!(info.status, status, "{}", due);
            assert_eq!(info.label, label);
        }
    }

    #[test]
    fn days_until_is_signed() {
        assert_eq!(due_info(date(2025, 3, 7), today(), 2).days_until, -3);
        assert_eq!(due_info(date(2025, 4, 10), today(), 2).days_until, 31);
    }

    #[test]
    fn soon_window_is_configurable() {
        let info = due_info(date(2025, 3, 15), today(), 7);
        assert!(info.is_due_soon());
        assert_eq!(info.label, "Due in 5 days");
    }

    #[test]
    fn overdue_and_due_soon_skip_done_and_undated() {
        let tasks = vec![
            Task::new("late", "late", 1).with_due(date(2025, 3, 1)),
            Task::new("late-done", "late done", 2)
                .with_due(date(2025, 3, 1))
                .done(),
            Task::new("today", "today", 3).with_due(date(2025, 3, 10)),
            Task::new("soon", "soon", 4).with_due(date(2025, 3, 12)),
            Task::new("later", "later", 5).with_due(date(2025, 5, 1)),
            Task::new("none", "no date", 6),
        ];
        let ids = |v: Vec<&Task>| v.iter().map(|t| t.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(overdue(&tasks, today())), vec!["late"]);
        assert_eq!(
            ids(due_soon(&tasks, today(), DEFAULT_SOON_DAYS)),
            vec!["today", "soon"]
        );
    }
}
