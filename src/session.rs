use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::io::store::{StateStore, StoreError};
use crate::model::config::Config;
use crate::model::recurring::{Frequency, RecurringTask};
use crate::model::state::{HistoryState, PersistedState, STATE_VERSION, SubtaskMap, Theme};
use crate::model::tag::Tag;
use crate::model::task::{Category, Priority, Subtask, Task, TaskDraft};
use crate::ops::export::{self, ImportError};
use crate::ops::history::History;
use crate::ops::subtask_ops::{self, Progress};
use crate::ops::tag_ops::{self, TagError};
use crate::ops::task_ops::{self, TaskError};
use crate::ops::view::{self, DerivedView, ViewParams};
use crate::ops::{due, recurring};

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Fresh opaque identifier
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// All application state for one run, owned in one place.
///
/// Task changes go through the undo history; tags, subtasks, theme and
/// recurring templates are kept alongside without undo. Every committed
/// change is written through the store. Save failures are logged and
/// otherwise ignored.
pub struct Session<S: StateStore> {
    store: S,
    config: Config,
    tasks: History<Vec<Task>>,
    tags: Vec<Tag>,
    subtasks: SubtaskMap,
    theme: Theme,
    recurring: Vec<RecurringTask>,
}

impl<S: StateStore> Session<S> {
    /// Load state from `store` (empty if nothing is stored) and restore the
    /// undo history when it still matches the stored tasks.
    pub fn open(store: S, config: Config) -> Result<Self, StoreError> {
        let state = store.load()?.unwrap_or_default();
        let limit = config.history.limit;

        let restored = store
            .load_history()
            .and_then(|h| History::from_parts(h.snapshots, h.cursor, limit))
            .filter(|h| *h.current() == state.tasks);
        let tasks = match restored {
            Some(history) => history,
            None => History::with_limit(state.tasks, limit),
        };

        Ok(Session {
            store,
            config,
            tasks,
            tags: state.tags,
            subtasks: state.subtasks,
            theme: state.theme,
            recurring: state.recurring,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Everything that gets written to the store
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState {
            version: STATE_VERSION,
            tasks: self.tasks.current().clone(),
            tags: self.tags.clone(),
            subtasks: self.subtasks.clone(),
            theme: self.theme,
            recurring: self.recurring.clone(),
        }
    }

    fn history_state(&self) -> HistoryState {
        HistoryState {
            cursor: self.tasks.cursor(),
            snapshots: self.tasks.snapshots().cloned().collect(),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.persisted_state()) {
            tracing::warn!("could not save state: {}", e);
        }
        if let Err(e) = self.store.save_history(&self.history_state()) {
            tracing::warn!("could not save undo history: {}", e);
        }
    }

    /// Record `next` as the new task list. Unchanged lists are not recorded.
    fn commit(&mut self, next: Vec<Task>) -> bool {
        if next == *self.tasks.current() {
            return false;
        }
        self.tasks.set(next);
        tracing::debug!(
            cursor = self.tasks.cursor(),
            snapshots = self.tasks.len(),
            "committed task change"
        );
        self.persist();
        true
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// The current task list, in insertion order
    pub fn tasks(&self) -> &[Task] {
        self.tasks.current()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        task_ops::find_task(self.tasks(), id)
    }

    /// Resolve an exact id or unique prefix
    pub fn resolve(&self, reference: &str) -> Result<String, TaskError> {
        task_ops::resolve_id(self.tasks(), reference)
    }

    /// Run the view pipeline over the current tasks
    pub fn view(&self, params: &ViewParams) -> DerivedView {
        view::derive_view(self.tasks(), params)
    }

    /// A draft carrying the configured default category and priority
    pub fn draft(&self, text: impl Into<String>) -> TaskDraft {
        TaskDraft {
            text: text.into(),
            category: self.config.tasks.default_category.clone(),
            priority: self.config.tasks.default_priority,
            due_date: None,
        }
    }

    /// Add a task. Returns its id, or `None` if the text was blank.
    pub fn add_task(&mut self, draft: &TaskDraft) -> Option<String> {
        self.add_task_at(draft, now_ms())
    }

    pub fn add_task_at(&mut self, draft: &TaskDraft, now: i64) -> Option<String> {
        let id = new_id();
        let next = task_ops::add(self.tasks(), draft, id.clone(), now)?;
        self.commit(next);
        Some(id)
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        let next = task_ops::toggle(self.tasks(), id);
        self.commit(next)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let next = task_ops::delete(self.tasks(), id);
        self.commit(next)
    }

    pub fn edit_text(&mut self, id: &str, text: &str) -> bool {
        let next = task_ops::edit_text(self.tasks(), id, text);
        self.commit(next)
    }

    pub fn set_due(&mut self, id: &str, due: Option<NaiveDate>) -> bool {
        let next = task_ops::set_due(self.tasks(), id, due);
        self.commit(next)
    }

    /// Remove completed tasks. Returns how many were removed.
    pub fn clear_done(&mut self) -> usize {
        let before = self.tasks().len();
        let next = task_ops::clear_done(self.tasks());
        let removed = before - next.len();
        self.commit(next);
        removed
    }

    pub fn select_ids(&self, predicate: impl Fn(&Task) -> bool) -> Vec<String> {
        task_ops::select_ids(self.tasks(), predicate)
    }

    pub fn mark_done(&mut self, ids: &[String]) -> bool {
        let next = task_ops::mark_done(self.tasks(), ids);
        self.commit(next)
    }

    pub fn mark_undone(&mut self, ids: &[String]) -> bool {
        let next = task_ops::mark_undone(self.tasks(), ids);
        self.commit(next)
    }

    pub fn delete_many(&mut self, ids: &[String]) -> bool {
        let next = task_ops::delete_many(self.tasks(), ids);
        self.commit(next)
    }

    pub fn move_to_category(&mut self, ids: &[String], category: &Category) -> bool {
        let next = task_ops::move_to_category(self.tasks(), ids, category);
        self.commit(next)
    }

    pub fn set_priority(&mut self, ids: &[String], priority: Priority) -> bool {
        let next = task_ops::set_priority(self.tasks(), ids, priority);
        self.commit(next)
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<&Task> {
        due::overdue(self.tasks(), today)
    }

    pub fn due_soon(&self, today: NaiveDate) -> Vec<&Task> {
        due::due_soon(self.tasks(), today, self.config.due.soon_days)
    }

    // -----------------------------------------------------------------------
    // Undo / redo
    // -----------------------------------------------------------------------

    pub fn undo(&mut self) -> bool {
        let moved = self.tasks.undo();
        if moved {
            self.persist();
        }
        moved
    }

    pub fn redo(&mut self) -> bool {
        let moved = self.tasks.redo();
        if moved {
            self.persist();
        }
        moved
    }

    pub fn can_undo(&self) -> bool {
        self.tasks.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.tasks.can_redo()
    }

    /// `(cursor, retained snapshots)`
    pub fn history_position(&self) -> (usize, usize) {
        (self.tasks.cursor(), self.tasks.len())
    }

    // -----------------------------------------------------------------------
    // Export / import
    // -----------------------------------------------------------------------

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        export::export_json(self.tasks())
    }

    pub fn export_csv(&self) -> String {
        export::export_csv(self.tasks())
    }

    /// Replace the task list with the content of an exported JSON file.
    /// On error nothing changes. Returns the number of imported tasks.
    pub fn import_json(&mut self, content: &str) -> Result<usize, ImportError> {
        let tasks = export::import_json(content)?;
        let count = tasks.len();
        self.commit(tasks);
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------------

    pub fn subtasks(&self, task_id: &str) -> &[Subtask] {
        subtask_ops::subtasks_of(&self.subtasks, task_id)
    }

    pub fn subtask_progress(&self, task_id: &str) -> Progress {
        subtask_ops::progress(&self.subtasks, task_id)
    }

    pub fn add_subtask(&mut self, task_id: &str, text: &str) -> Option<String> {
        let id = subtask_ops::add_subtask(&mut self.subtasks, task_id, text, new_id())?;
        self.persist();
        Some(id)
    }

    pub fn toggle_subtask(&mut self, task_id: &str, subtask_id: &str) -> bool {
        self.persist_if(|s| subtask_ops::toggle_subtask(&mut s.subtasks, task_id, subtask_id))
    }

    pub fn delete_subtask(&mut self, task_id: &str, subtask_id: &str) -> bool {
        self.persist_if(|s| subtask_ops::delete_subtask(&mut s.subtasks, task_id, subtask_id))
    }

    pub fn clear_subtasks(&mut self, task_id: &str) -> usize {
        let removed = subtask_ops::clear_subtasks(&mut self.subtasks, task_id);
        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Drop subtasks whose task no longer exists. Returns the task ids dropped.
    pub fn prune_subtasks(&mut self) -> Vec<String> {
        let tasks = self.tasks.current();
        let pruned = subtask_ops::prune_orphans(&mut self.subtasks, tasks);
        if !pruned.is_empty() {
            self.persist();
        }
        pruned
    }

    // -----------------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------------

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn find_tag(&self, reference: &str) -> Option<&Tag> {
        tag_ops::find_tag(&self.tags, reference)
    }

    pub fn add_tag(&mut self, name: &str) -> Option<Tag> {
        let tag = tag_ops::add_tag(&mut self.tags, name, new_id())?;
        self.persist();
        Some(tag)
    }

    pub fn remove_tag(&mut self, id: &str) -> bool {
        self.persist_if(|s| tag_ops::remove_tag(&mut s.tags, id))
    }

    pub fn update_tag(
        &mut self,
        id: &str,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<(), TagError> {
        tag_ops::update_tag(&mut self.tags, id, name, color)?;
        self.persist();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Theme
    // -----------------------------------------------------------------------

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.persist();
        }
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.set_theme(self.theme.toggled());
        self.theme
    }

    // -----------------------------------------------------------------------
    // Recurring templates
    // -----------------------------------------------------------------------

    pub fn recurring(&self) -> &[RecurringTask] {
        &self.recurring
    }

    /// Register a template. Its first task is spawned one interval after `now`.
    pub fn add_recurring(&mut self, draft: &TaskDraft, frequency: Frequency, now: i64) -> bool {
        let text = draft.text.trim();
        if text.is_empty() {
            return false;
        }
        self.recurring.push(RecurringTask {
            text: text.to_string(),
            category: draft.category.clone(),
            priority: draft.priority,
            frequency,
            last_created: now,
        });
        self.persist();
        true
    }

    pub fn remove_recurring(&mut self, index: usize) -> Option<RecurringTask> {
        if index >= self.recurring.len() {
            return None;
        }
        let removed = self.recurring.remove(index);
        self.persist();
        Some(removed)
    }

    /// Spawn a task for every due template, as one undo step.
    /// Returns the ids of the new tasks.
    pub fn run_recurring(&mut self, now: i64) -> Vec<String> {
        let drafts = recurring::take_due(&mut self.recurring, now);
        if drafts.is_empty() {
            return Vec::new();
        }
        let mut next = self.tasks().to_vec();
        let mut ids = Vec::new();
        for draft in &drafts {
            let id = new_id();
            if let Some(with_task) = task_ops::add(&next, draft, id.clone(), now) {
                next = with_task;
                ids.push(id);
            }
        }
        if !self.commit(next) {
            self.persist();
        }
        ids
    }

    fn persist_if(&mut self, change: impl FnOnce(&mut Self) -> bool) -> bool {
        let changed = change(self);
        if changed {
            self.persist();
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::store::MemoryStore;
    use crate::ops::view::{SortKey, StatusFilter};

    fn open(store: &MemoryStore) -> Session<MemoryStore> {
        Session::open(store.clone(), Config::default()).unwrap()
    }

    fn add(session: &mut Session<MemoryStore>, text: &str) -> String {
        let draft = session.draft(text);
        session.add_task(&draft).unwrap()
    }

    #[test]
    fn empty_store_opens_with_defaults() {
        let store = MemoryStore::new();
        let session = open(&store);
        assert!(session.tasks().is_empty());
        assert_eq!(session.tags().len(), 3);
        assert_eq!(session.theme(), Theme::Dark);
        assert!(!session.can_undo());
    }

    #[test]
    fn add_saves_and_is_undoable() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let id = add(&mut session, "Buy milk");
        assert_eq!(store.snapshot().unwrap().tasks[0].id, id);
        assert!(session.can_undo());
        assert!(session.undo());
        assert!(session.tasks().is_empty());
        assert!(store.snapshot().unwrap().tasks.is_empty());
        assert!(session.redo());
        assert_eq!(session.tasks().len(), 1);
    }

    #[test]
    fn blank_add_changes_nothing() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let draft = session.draft("   ");
        assert!(session.add_task(&draft).is_none());
        assert!(session.tasks().is_empty());
        assert_eq!(store.save_count(), 0);
        assert!(!session.can_undo());
    }

    #[test]
    fn noop_changes_are_not_recorded() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        add(&mut session, "one");
        let (_, len) = session.history_position();
        assert!(!session.toggle("missing"));
        assert!(!session.delete("missing"));
        assert_eq!(session.clear_done(), 0);
        assert_eq!(session.history_position().1, len);
    }

    #[test]
    fn set_after_undo_drops_redo() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let a = add(&mut session, "a");
        session.toggle(&a);
        session.undo();
        assert!(session.can_redo());
        add(&mut session, "b");
        assert!(!session.can_redo());
        assert!(!session.task(&a).unwrap().done);
    }

    #[test]
    fn batch_and_clear_done() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let a = add(&mut session, "a");
        let b = add(&mut session, "b");
        add(&mut session, "c");
        assert!(session.mark_done(&[a.clone(), b.clone()]));
        assert!(session.move_to_category(&[a.clone()], &Category::Work));
        assert!(session.set_priority(&[b.clone()], Priority::High));
        let done = session.select_ids(|t| t.done);
        assert_eq!(done, vec![a.clone(), b.clone()]);
        assert_eq!(session.clear_done(), 2);
        assert_eq!(session.tasks().len(), 1);
        assert!(session.undo());
        assert_eq!(session.tasks().len(), 3);
    }

    #[test]
    fn view_uses_current_tasks() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let a = add(&mut session, "alpha");
        add(&mut session, "beta");
        session.toggle(&a);
        let view = session.view(&ViewParams {
            status: StatusFilter::Active,
            sort: SortKey::Name,
            ..Default::default()
        });
        assert_eq!(view.tasks.len(), 1);
        assert_eq!(view.tasks[0].text, "beta");
        assert_eq!(view.stats.total, 2);
        assert_eq!(view.stats.done, 1);
    }

    #[test]
    fn history_survives_reopen() {
        let store = MemoryStore::new();
        {
            let mut session = open(&store);
            add(&mut session, "one");
            add(&mut session, "two");
        }
        let mut session = open(&store);
        assert_eq!(session.tasks().len(), 2);
        assert!(session.undo());
        assert_eq!(session.tasks().len(), 1);
    }

    #[test]
    fn stale_history_is_discarded() {
        let store = MemoryStore::new();
        {
            let mut session = open(&store);
            add(&mut session, "one");
        }
        let mut edited = store.snapshot().unwrap();
        edited.tasks.clear();
        store.save(&edited).unwrap();

        let session = open(&store);
        assert!(session.tasks().is_empty());
        assert!(!session.can_undo());
    }

    #[test]
    fn history_limit_from_config() {
        let store = MemoryStore::new();
        let mut config = Config::default();
        config.history.limit = 3;
        let mut session = Session::open(store, config).unwrap();
        for i in 0..5 {
            add(&mut session, &format!("task {}", i));
        }
        assert_eq!(session.history_position(), (2, 3));
        while session.undo() {}
        assert_eq!(session.tasks().len(), 3);
    }

    #[test]
    fn save_failure_is_swallowed() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        store.set_fail_saves(true);
        let id = add(&mut session, "still added");
        assert!(session.task(&id).is_some());
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn import_replaces_and_can_be_undone() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        add(&mut session, "existing");
        let json = r#"[{"id":"x","text":"imported","done":false,"createdAt":1}]"#;
        assert_eq!(session.import_json(json).unwrap(), 1);
        assert_eq!(session.tasks()[0].text, "imported");
        assert!(session.undo());
        assert_eq!(session.tasks()[0].text, "existing");
    }

    #[test]
    fn failed_import_leaves_state_untouched() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        add(&mut session, "existing");
        let saves = store.save_count();
        assert!(session.import_json("{\"not\": \"array\"}").is_err());
        assert_eq!(session.tasks().len(), 1);
        assert_eq!(store.save_count(), saves);
    }

    #[test]
    fn subtasks_are_outside_history() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let t = add(&mut session, "parent");
        let s = session.add_subtask(&t, "child").unwrap();
        assert!(session.toggle_subtask(&t, &s));
        assert_eq!(session.subtask_progress(&t).percentage, 100);
        let (cursor, _) = session.history_position();
        session.undo();
        assert_eq!(session.subtasks(&t).len(), 1);
        assert_eq!(session.history_position().0, cursor - 1);
        assert_eq!(store.snapshot().unwrap().subtasks[&t].len(), 1);
    }

    #[test]
    fn prune_after_delete() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let t = add(&mut session, "parent");
        session.add_subtask(&t, "child");
        session.delete(&t);
        assert_eq!(session.subtasks(&t).len(), 1);
        assert_eq!(session.prune_subtasks(), vec![t.clone()]);
        assert!(session.subtasks(&t).is_empty());
    }

    #[test]
    fn tags_and_theme_persist() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let tag = session.add_tag("errands").unwrap();
        session.update_tag(&tag.id, None, Some("#112233")).unwrap();
        assert!(session.remove_tag("1"));
        assert_eq!(session.toggle_theme(), Theme::Light);

        let reopened = open(&store);
        assert_eq!(reopened.theme(), Theme::Light);
        assert_eq!(reopened.tags().len(), 3);
        assert_eq!(reopened.find_tag("errands").unwrap().color, "#112233");
    }

    #[test]
    fn recurring_spawns_once_per_interval() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let day = Frequency::Daily.interval_ms();
        let draft = session.draft("water plants");
        assert!(session.add_recurring(&draft, Frequency::Daily, 0));
        assert!(session.run_recurring(day - 1).is_empty());
        let ids = session.run_recurring(day);
        assert_eq!(ids.len(), 1);
        assert_eq!(session.task(&ids[0]).unwrap().text, "water plants");
        assert!(session.run_recurring(day + 1).is_empty());
        assert_eq!(session.recurring()[0].last_created, day);
        assert!(session.remove_recurring(0).is_some());
        assert!(session.remove_recurring(0).is_none());
    }

    #[test]
    fn due_queries_respect_config() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let t = add(&mut session, "soonish");
        session.set_due(&t, NaiveDate::from_ymd_opt(2025, 3, 12));
        assert_eq!(session.due_soon(today).len(), 1);
        assert!(session.overdue(today).is_empty());
        session.set_due(&t, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(session.overdue(today).len(), 1);
    }
}
