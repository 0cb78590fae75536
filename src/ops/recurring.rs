use crate::model::recurring::RecurringTask;
use crate::model::task::TaskDraft;

/// Collect a draft for every template due at `now` and stamp those
/// templates with `now`. Templates that are not due are left untouched.
pub fn take_due(templates: &mut [RecurringTask], now: i64) -> Vec<TaskDraft> {
    let mut drafts = Vec::new();
    for template in templates.iter_mut().filter(|t| t.is_due(now)) {
        drafts.push(TaskDraft {
            text: template.text.clone(),
            category: template.category.clone(),
            priority: template.priority,
            due_date: None,
        });
        template.last_created = now;
    }
    drafts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::recurring::Frequency;
    use crate::model::task::{Category, Priority};

    const DAY: i64 = 86_400_000;

    fn template(text: &str, frequency: Frequency, last_created: i64) -> RecurringTask {
        RecurringTask {
            text: text.into(),
            category: Category::Health,
            priority: Priority::High,
            frequency,
            last_created,
        }
    }

    #[test]
    fn only_due_templates_spawn() {
        let now = 100 * DAY;
        let mut templates = vec![
            template("water plants", Frequency::Daily, now - DAY),
            template("review budget", Frequency::Weekly, now - 3 * DAY),
            template("pay rent", Frequency::Monthly, now - 30 * DAY),
        ];
        let drafts = take_due(&mut templates, now);
        let texts: Vec<_> = drafts.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["water plants", "pay rent"]);
        assert_eq!(drafts[0].category, Category::Health);
        assert_eq!(drafts[0].priority, Priority::High);
        assert_eq!(templates[0].last_created, now);
        assert_eq!(templates[1].last_created, now - 3 * DAY);
        assert_eq!(templates[2].last_created, now);
    }

    #[test]
    fn second_run_spawns_nothing() {
        let now = 10 * DAY;
        let mut templates = vec![template("stretch", Frequency::Daily, 0)];
        assert_eq!(take_due(&mut templates, now).len(), 1);
        assert!(take_due(&mut templates, now + 1).is_empty());
    }
}
